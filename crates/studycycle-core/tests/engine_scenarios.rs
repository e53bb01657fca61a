//! Integration tests for the full study cycle: allocation, timer runs,
//! session recording and cache persistence working together.

use chrono::NaiveDate;
use studycycle_core::{
    CachedState, CycleConfig, CycleEngine, Event, LocalCache, SessionRecorder, Subject,
    TimerMode, TimerStatus, TimerVariant,
};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
}

fn three_subject_config(variant: TimerVariant) -> CycleConfig {
    let mut config = CycleConfig::default();
    config.settings.variant = variant;
    for (name, emphasis) in [("Math", 8), ("Physics", 4), ("English", 4)] {
        let color = config.next_color().to_string();
        config.subjects.push(Subject::new(name, emphasis, color));
    }
    config
}

/// Two subjects weighted 8 and 4 on a 6-hour day split 240/120 minutes,
/// and completing the first full run advances to the second subject.
#[test]
fn weighted_split_and_advancement() {
    let mut config = CycleConfig::default();
    for day in [
        chrono::Weekday::Sun,
        chrono::Weekday::Mon,
        chrono::Weekday::Tue,
        chrono::Weekday::Wed,
        chrono::Weekday::Thu,
        chrono::Weekday::Fri,
        chrono::Weekday::Sat,
    ] {
        config.weekly_hours.set(day, 6.0);
    }
    let color_a = config.next_color().to_string();
    config.subjects.push(Subject::new("Math", 8, color_a));
    let color_b = config.next_color().to_string();
    config.subjects.push(Subject::new("Physics", 4, color_b));

    let mut engine = CycleEngine::new(config);
    engine.start_at(0, monday()).unwrap();
    assert_eq!(engine.timer().duration_ms, 240 * 60_000);

    engine.tick_at(240 * 60_000, monday()).unwrap();
    assert_eq!(engine.cycle().current_subject_index, 1);
    assert_eq!(engine.timer().duration_ms, 120 * 60_000);
}

/// Run every subject's allocation to exhaustion and verify the day ends in
/// a completed cycle with fresh allocations.
#[test]
fn full_continuous_day_completes_a_cycle() {
    let mut engine = CycleEngine::new(three_subject_config(TimerVariant::Continuous));
    let mut recorder = SessionRecorder::new();
    let mut sessions = Vec::new();

    // Monday budget is 8h; weights 8/4/4 give 240/120/120 minutes.
    let mut now = 0u64;
    for expected_minutes in [240u64, 120, 120] {
        let started = engine.start_at(now, monday()).expect("start");
        recorder.observe(&started);
        assert_eq!(engine.timer().duration_ms, expected_minutes * 60_000);

        now += engine.timer().duration_ms;
        let completed = engine.tick_at(now, monday()).expect("completion");
        if let Some(session) = recorder.observe(&completed) {
            sessions.push(session);
        }
    }

    assert_eq!(engine.cycle().completed_cycles, 1);
    assert_eq!(engine.cycle().current_subject_index, 0);
    assert!(engine
        .cycle()
        .subject_progress
        .iter()
        .all(|p| p.completed_ms == 0));

    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0].subject_name, "Math");
    assert_eq!(sessions[0].duration_seconds, 240 * 60);
    assert!(sessions.iter().all(|s| s.completed));
}

/// Pause mid-block, reset, and verify the discarded segment neither records
/// a session nor loses prior progress.
#[test]
fn reset_discards_segment_but_keeps_progress() {
    let mut engine = CycleEngine::new(three_subject_config(TimerVariant::Continuous));
    let mut recorder = SessionRecorder::new();

    // Complete the first block.
    let started = engine.start_at(0, monday()).unwrap();
    recorder.observe(&started);
    let first_duration = engine.timer().duration_ms;
    let completed = engine.tick_at(first_duration, monday()).unwrap();
    assert!(recorder.observe(&completed).is_some());

    // Start the second subject, run 10 minutes, then reset.
    let now = first_duration;
    let started = engine.start_at(now, monday()).unwrap();
    recorder.observe(&started);
    engine.pause_at(now + 600_000);
    let reset = engine.reset().unwrap();
    assert!(recorder.observe(&reset).is_none());

    // No session for the discarded segment, and restarting offers the
    // subject's untouched remaining allocation.
    assert_eq!(engine.timer().status, TimerStatus::Idle);
    assert_eq!(engine.timer().duration_ms, 120 * 60_000);
    assert_eq!(engine.cycle().subject_progress[0].completed_ms, first_duration);
    assert_eq!(engine.cycle().subject_progress[1].completed_ms, 0);
}

/// A pomodoro day: focus and break blocks alternate, breaks never record
/// sessions, and the fourth focus block triggers a long break.
#[test]
fn pomodoro_day_records_only_focus_blocks() {
    let mut config = three_subject_config(TimerVariant::Pomodoro);
    config.settings.focus_minutes = 25;
    config.settings.long_break_interval = 4;
    let mut engine = CycleEngine::new(config);
    let mut recorder = SessionRecorder::new();
    let mut sessions = Vec::new();
    let mut now = 0u64;

    for round in 1..=4u32 {
        let started = engine.start_at(now, monday()).unwrap();
        recorder.observe(&started);
        assert_eq!(engine.timer().mode, TimerMode::Focus);
        now += 25 * 60_000;
        let completed = engine.tick_at(now, monday()).unwrap();
        if let Some(session) = recorder.observe(&completed) {
            sessions.push(session);
        }
        let expected_break = if round == 4 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        };
        assert_eq!(engine.timer().mode, expected_break);

        // Run the break; nothing is recorded for it.
        let started = engine.start_at(now, monday()).unwrap();
        recorder.observe(&started);
        now += engine.timer().duration_ms;
        let completed = engine.tick_at(now, monday()).unwrap();
        assert!(recorder.observe(&completed).is_none());
    }

    assert_eq!(sessions.len(), 4);
    assert_eq!(engine.timer().completed_blocks, 4);
    assert!(sessions.iter().all(|s| s.duration_seconds == 25 * 60));
    // Focus time was credited to the first subject throughout.
    assert_eq!(
        engine.cycle().subject_progress[0].completed_ms,
        4 * 25 * 60_000
    );
}

/// Persist mid-run state through the cache and rebuild the engine: the
/// stale running timer settles to paused and the run resumes where it
/// stopped.
#[test]
fn cache_roundtrip_preserves_a_paused_run() {
    let dir = tempfile::tempdir().unwrap();
    let cache = LocalCache::with_path(dir.path().join("state.json"));

    let mut engine = CycleEngine::new(three_subject_config(TimerVariant::Continuous));
    engine.start_at(0, monday()).unwrap();
    engine.pause_at(900_000); // 15 minutes in
    cache
        .save(&CachedState::new(engine.config().clone(), engine.snapshot()))
        .unwrap();

    let state = cache.load().unwrap();
    let restored = CycleEngine::from_parts(state.config, state.timer, state.cycle);
    assert_eq!(restored.timer().status, TimerStatus::Paused);
    assert_eq!(restored.timer().accumulated_ms, 900_000);
    assert_eq!(restored.timer().duration_ms, engine.timer().duration_ms);
    assert_eq!(restored.config().subjects.len(), 3);
}

/// Switching variants mid-day keeps subject progress intact.
#[test]
fn variant_switch_preserves_progress() {
    let mut engine = CycleEngine::new(three_subject_config(TimerVariant::Continuous));
    engine.start_at(0, monday()).unwrap();
    let duration = engine.timer().duration_ms;
    engine.tick_at(duration, monday()).unwrap();

    let mut settings = engine.config().settings.clone();
    settings.variant = TimerVariant::Pomodoro;
    engine.update_settings(settings);

    assert_eq!(engine.cycle().subject_progress[0].completed_ms, duration);
    assert_eq!(engine.timer().duration_ms, 25 * 60_000);

    // And back: the idle duration returns to the cycle's remaining time.
    let mut settings = engine.config().settings.clone();
    settings.variant = TimerVariant::Continuous;
    engine.update_settings(settings);
    assert_eq!(engine.timer().mode, TimerMode::Focus);
    assert_eq!(engine.timer().duration_ms, 120 * 60_000);
}

/// Subject edits mid-day reallocate while preserving completed time, and
/// events keep observers informed.
#[test]
fn subject_edits_reallocate_and_notify() {
    use std::sync::{Arc, Mutex};

    let mut engine = CycleEngine::new(three_subject_config(TimerVariant::Continuous));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.subscribe(move |event| {
        if matches!(event, Event::ConfigChanged { .. }) {
            sink.lock().unwrap().push(());
        }
    });

    engine.start_at(0, monday()).unwrap();
    let duration = engine.timer().duration_ms;
    engine.tick_at(duration, monday()).unwrap();

    let physics_id = engine.config().subjects[1].id.clone();
    assert!(engine.remove_subject(&physics_id));
    assert_eq!(engine.config().subjects.len(), 2);
    // Math's completed time survives the reallocation.
    assert_eq!(engine.cycle().subject_progress[0].completed_ms, duration);

    engine.add_subject("Chemistry", 2);
    assert_eq!(engine.cycle().subject_progress.len(), 3);
    assert_eq!(engine.cycle().subject_progress[2].completed_ms, 0);

    assert_eq!(events.lock().unwrap().len(), 2);
}
