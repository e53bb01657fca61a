use clap::Subcommand;
use studycycle_core::{FocusSession, SessionRecorder, TimerStatus};

use super::{load_engine, open_sync, persist, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current block
    Start,
    /// Pause the running block
    Pause,
    /// Resume a paused block
    Resume,
    /// Discard the current block without recording it
    Reset,
    /// Complete the current block immediately
    Skip,
    /// Check for duration exhaustion once
    Tick,
    /// Print the current timer and cycle state as JSON
    Status,
    /// Run the timer in the foreground until the block completes
    Run,
}

pub fn run(action: TimerAction) -> CliResult {
    let mut sync = open_sync()?;
    let mut engine = load_engine(&sync);

    match action {
        TimerAction::Start => {
            match engine.start() {
                Some(event) => print_json(&event)?,
                None => print_json(&engine.snapshot())?,
            }
            persist(&mut sync, &engine)
        }
        TimerAction::Pause => {
            match engine.pause() {
                Some(event) => print_json(&event)?,
                None => print_json(&engine.snapshot())?,
            }
            persist(&mut sync, &engine)
        }
        TimerAction::Resume => {
            match engine.resume() {
                Some(event) => print_json(&event)?,
                None => print_json(&engine.snapshot())?,
            }
            persist(&mut sync, &engine)
        }
        TimerAction::Reset => {
            match engine.reset() {
                Some(event) => print_json(&event)?,
                None => print_json(&engine.snapshot())?,
            }
            persist(&mut sync, &engine)
        }
        TimerAction::Skip => {
            let event = engine.skip();
            if let Some(event) = &event {
                record_completion(&mut sync, event)?;
                print_json(event)?;
            } else {
                print_json(&engine.snapshot())?;
            }
            persist(&mut sync, &engine)
        }
        TimerAction::Tick => {
            if let Some(event) = engine.tick() {
                record_completion(&mut sync, &event)?;
                print_json(&event)?;
            } else {
                print_json(&engine.snapshot())?;
            }
            persist(&mut sync, &engine)
        }
        TimerAction::Status => {
            let snapshot = engine.snapshot();
            print_json(&serde_json::json!({
                "timer": snapshot.timer,
                "cycle": snapshot.cycle,
                "remainingMs": engine.remaining_ms(),
                "currentSubject": engine.current_subject(),
            }))
        }
        TimerAction::Run => run_foreground(&mut sync, &mut engine),
    }
}

/// Persist a completed focus block as a session. The start event may have
/// happened in an earlier invocation, so the record is derived from the
/// completion alone.
fn record_completion(
    sync: &mut studycycle_core::SyncService,
    event: &studycycle_core::Event,
) -> CliResult {
    if let Some(session) = FocusSession::from_completion(event) {
        submit_session(sync, &session)?;
    }
    Ok(())
}

fn submit_session(
    sync: &studycycle_core::SyncService,
    session: &FocusSession,
) -> CliResult {
    let rt = runtime()?;
    match rt.block_on(sync.store().create_session(session)) {
        Ok(saved) => eprintln!(
            "recorded {}s session for {}",
            saved.duration_seconds, saved.subject_name
        ),
        Err(e) => log::warn!("session record failed: {e}"),
    }
    Ok(())
}

/// Foreground loop: tick once a second until the active block completes,
/// printing a countdown to stderr. Uses the event-driven recorder since the
/// start and completion happen in this process.
fn run_foreground(
    sync: &mut studycycle_core::SyncService,
    engine: &mut studycycle_core::CycleEngine,
) -> CliResult {
    let mut recorder = SessionRecorder::new();
    let rt = runtime()?;

    if engine.timer().status != TimerStatus::Running {
        let event = match engine.timer().status {
            TimerStatus::Paused => engine.resume(),
            _ => engine.start(),
        };
        let Some(event) = event else {
            return Err("no block available to run".into());
        };
        recorder.observe(&event);
        print_json(&event)?;
        persist(sync, engine)?;
    }

    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
        if let Some(event) = engine.tick() {
            if let Some(session) = recorder
                .observe(&event)
                .or_else(|| FocusSession::from_completion(&event))
            {
                submit_session(sync, &session)?;
            }
            eprintln!();
            print_json(&event)?;
            persist(sync, engine)?;
            if engine.timer().status != TimerStatus::Running {
                return Ok(());
            }
            // Auto-started next block; keep going.
            continue;
        }
        sync.observe(engine);
        rt.block_on(sync.pump());

        let remaining = engine.remaining_ms() / 1000;
        eprint!("\r{:02}:{:02}:{:02} ", remaining / 3600, remaining % 3600 / 60, remaining % 60);
    }
}
