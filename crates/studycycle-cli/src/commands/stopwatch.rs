use clap::Subcommand;
use studycycle_core::{data_dir, RemoteStore, Stopwatch, TimerStatus};

use super::{api_url, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Start a new stopwatch run
    Start {
        /// Label recorded on the resulting session
        #[arg(long, default_value = "Stopwatch")]
        label: String,
    },
    /// Pause the stopwatch
    Pause,
    /// Resume a paused stopwatch
    Resume,
    /// Discard the run without recording
    Reset,
    /// Stop and record the run as a session
    Stop,
    /// Print elapsed time
    Status,
}

fn state_path() -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("stopwatch.json"))
}

fn load() -> Result<Stopwatch, Box<dyn std::error::Error>> {
    let path = state_path()?;
    match std::fs::read_to_string(&path) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Stopwatch::default()),
        Err(e) => Err(e.into()),
    }
}

fn save(stopwatch: &Stopwatch) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(state_path()?, serde_json::to_string(stopwatch)?)?;
    Ok(())
}

/// Begin a fresh run, refusing while the stored stopwatch is mid-run so an
/// accumulated session cannot be silently discarded.
fn begin(existing: &Stopwatch, label: String) -> Result<Stopwatch, Box<dyn std::error::Error>> {
    if existing.status() != TimerStatus::Idle {
        return Err("a stopwatch run is already in progress; stop or reset it first".into());
    }
    let mut stopwatch = Stopwatch::new(label);
    stopwatch.start();
    Ok(stopwatch)
}

pub fn run(action: StopwatchAction) -> CliResult {
    match action {
        StopwatchAction::Start { label } => {
            let stopwatch = begin(&load()?, label)?;
            save(&stopwatch)?;
            print_json(&stopwatch)
        }
        StopwatchAction::Pause => {
            let mut stopwatch = load()?;
            if !stopwatch.pause() {
                return Err("stopwatch is not running".into());
            }
            save(&stopwatch)?;
            print_json(&stopwatch)
        }
        StopwatchAction::Resume => {
            let mut stopwatch = load()?;
            if !stopwatch.resume() {
                return Err("stopwatch is not paused".into());
            }
            save(&stopwatch)?;
            print_json(&stopwatch)
        }
        StopwatchAction::Reset => {
            let mut stopwatch = load()?;
            stopwatch.reset();
            save(&stopwatch)?;
            print_json(&stopwatch)
        }
        StopwatchAction::Stop => {
            let mut stopwatch = load()?;
            let session = stopwatch.stop_and_save();
            save(&stopwatch)?;
            let Some(session) = session else {
                println!("{{}}");
                eprintln!("run too short to record");
                return Ok(());
            };
            let store = RemoteStore::new(&api_url())?;
            let saved = runtime()?.block_on(store.create_session(&session))?;
            print_json(&saved)
        }
        StopwatchAction::Status => {
            let stopwatch = load()?;
            print_json(&serde_json::json!({
                "status": stopwatch.status(),
                "label": stopwatch.label(),
                "elapsedMs": stopwatch.elapsed_ms(),
            }))
        }
    }
}
