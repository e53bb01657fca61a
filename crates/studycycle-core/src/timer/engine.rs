//! The cycle engine: timer state machine plus cycle coordinator.
//!
//! A wall-clock-based state machine with no internal threads. Direct calls
//! drive start/pause/resume/reset/skip; the caller invokes `tick()`
//! periodically (~1s) to detect duration exhaustion, so completion is
//! eventually consistent within one tick.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Idle (reset/completion)
//! ```
//!
//! Completion is handled by the cycle coordinator half: in the continuous
//! variant it advances the subject pointer, in the pomodoro variant the mode
//! pointer. Every transition emits an [`Event`], returned to the caller and
//! broadcast to subscribers.

use chrono::{Local, NaiveDate, Utc};

use crate::allocation::{calc_allocations, merge_allocations};
use crate::config::{CycleConfig, Subject, TimerSettings, TimerVariant, FALLBACK_RUN_MS};
use crate::events::Event;
use crate::timer::state::{
    now_ms, CycleState, RuntimeSnapshot, TimerMode, TimerState, TimerStatus,
};

type Subscriber = Box<dyn FnMut(&Event) + Send>;

/// Single owner of the engine state within one context.
///
/// Cross-context concurrency is resolved upstream by last-write-wins at the
/// remote store; within one context all transitions are synchronous and
/// applied in call order.
pub struct CycleEngine {
    config: CycleConfig,
    timer: TimerState,
    cycle: CycleState,
    subscribers: Vec<Subscriber>,
}

impl CycleEngine {
    pub fn new(config: CycleConfig) -> Self {
        let duration = config.settings.mode_duration_ms(TimerMode::Focus);
        Self {
            config,
            timer: TimerState::idle(TimerMode::Focus, duration),
            cycle: CycleState::new(Local::now().date_naive()),
            subscribers: Vec::new(),
        }
    }

    /// Rebuild an engine from persisted parts. The caller is responsible for
    /// settling a stale `running` timer first (see `TimerState::settle`).
    pub fn from_parts(config: CycleConfig, timer: TimerState, cycle: CycleState) -> Self {
        let mut engine = Self {
            config,
            timer,
            cycle,
            subscribers: Vec::new(),
        };
        engine.cycle.clamp_index(engine.config.subjects.len());
        engine.resync_idle_duration();
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn cycle(&self) -> &CycleState {
        &self.cycle
    }

    pub fn current_subject(&self) -> Option<&Subject> {
        self.config.subjects.get(self.cycle.current_subject_index)
    }

    pub fn today_hours(&self) -> f64 {
        self.hours_for(Local::now().date_naive())
    }

    pub fn remaining_ms(&self) -> u64 {
        self.timer.remaining_ms(now_ms())
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            timer: self.timer.clone(),
            cycle: self.cycle.clone(),
        }
    }

    /// Register an observer for every emitted event.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Event) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms(), Local::now().date_naive())
    }

    /// Start a run from idle. Applies day rollover, lazily initializes
    /// allocations, and computes the run duration for the current variant.
    pub fn start_at(&mut self, now_ms: u64, today: NaiveDate) -> Option<Event> {
        if self.timer.status != TimerStatus::Idle {
            return None;
        }
        self.roll_over_if_new_day(today);
        if self.cycle.subject_progress.is_empty() && !self.config.subjects.is_empty() {
            self.cycle.subject_progress =
                calc_allocations(&self.config.subjects, self.hours_for(today));
            self.cycle.clamp_index(self.config.subjects.len());
        }

        self.timer.duration_ms = self.next_run_duration_ms();
        self.timer.status = TimerStatus::Running;
        self.timer.started_at_ms = Some(now_ms);
        self.timer.accumulated_ms = 0;

        let subject = self.current_subject();
        Some(self.emit(Event::Started {
            mode: self.timer.mode,
            subject_id: subject.map(|s| s.id.clone()),
            subject_name: subject.map(|s| s.name.clone()),
            duration_ms: self.timer.duration_ms,
            at: Utc::now(),
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.timer.status != TimerStatus::Running {
            return None;
        }
        let started = self.timer.started_at_ms.take()?;
        let total = self
            .timer
            .accumulated_ms
            .saturating_add(now_ms.saturating_sub(started));
        self.timer.accumulated_ms = total.min(self.timer.duration_ms);
        self.timer.status = TimerStatus::Paused;
        Some(self.emit(Event::Paused {
            remaining_ms: self.timer.remaining_ms(now_ms),
            at: Utc::now(),
        }))
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub fn resume_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.timer.status != TimerStatus::Paused {
            return None;
        }
        self.timer.status = TimerStatus::Running;
        self.timer.started_at_ms = Some(now_ms);
        Some(self.emit(Event::Resumed {
            remaining_ms: self.timer.remaining_ms(now_ms),
            at: Utc::now(),
        }))
    }

    /// Discard the current run segment and return to idle.
    ///
    /// The duration is recomputed for the *current* subject/mode using the
    /// remaining allocation, so prior completed progress is not erased.
    /// Progress, block counts and completed cycles are untouched.
    pub fn reset(&mut self) -> Option<Event> {
        if self.timer.status == TimerStatus::Idle {
            return None;
        }
        self.timer.status = TimerStatus::Idle;
        self.timer.started_at_ms = None;
        self.timer.accumulated_ms = 0;
        self.timer.duration_ms = self.next_run_duration_ms();
        Some(self.emit(Event::Reset { at: Utc::now() }))
    }

    /// User-forced completion, regardless of elapsed time.
    pub fn skip(&mut self) -> Option<Event> {
        self.complete_at(now_ms(), Local::now().date_naive())
    }

    pub fn skip_at(&mut self, now_ms: u64, today: NaiveDate) -> Option<Event> {
        self.complete_at(now_ms, today)
    }

    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms(), Local::now().date_naive())
    }

    /// Periodic duration-exhaustion check. Call at ~1s resolution while a
    /// run is active; detection may lag by up to one tick.
    pub fn tick_at(&mut self, now_ms: u64, today: NaiveDate) -> Option<Event> {
        if self.timer.status != TimerStatus::Running {
            return None;
        }
        if self.timer.remaining_ms(now_ms) > 0 {
            return None;
        }
        self.complete_at(now_ms, today)
    }

    pub fn complete(&mut self) -> Option<Event> {
        self.complete_at(now_ms(), Local::now().date_naive())
    }

    /// Completion transition: credit elapsed focus time, then advance the
    /// subject pointer (continuous) or the mode pointer (pomodoro).
    pub fn complete_at(&mut self, now_ms: u64, today: NaiveDate) -> Option<Event> {
        if self.timer.status == TimerStatus::Idle {
            return None;
        }
        let finished_mode = self.timer.mode;
        let planned = self.timer.duration_ms;
        let elapsed = self.timer.elapsed_ms(now_ms);
        let subject = self.current_subject().cloned();
        let mut blocks = self.timer.completed_blocks;

        if finished_mode == TimerMode::Focus {
            if let Some(progress) = self
                .cycle
                .subject_progress
                .get_mut(self.cycle.current_subject_index)
            {
                progress.completed_ms = progress.completed_ms.saturating_add(elapsed);
                progress.blocks_completed += 1;
            }
            blocks += 1;
        }

        let event = match self.config.settings.variant {
            TimerVariant::Continuous => self.advance_subject(blocks, today),
            TimerVariant::Pomodoro => self.advance_mode(finished_mode, blocks, now_ms),
        };

        let (next_mode, auto_started) = event;
        let completed = self.emit(Event::BlockCompleted {
            mode: finished_mode,
            subject_id: subject.as_ref().map(|s| s.id.clone()),
            subject_name: subject.map(|s| s.name),
            duration_ms: planned,
            elapsed_ms: elapsed,
            completed_blocks: blocks,
            next_mode,
            auto_started,
            at: Utc::now(),
        });
        Some(completed)
    }

    /// Pause a live run without emitting an event; used by the persistence
    /// layer right before the state leaves the process.
    pub fn settle(&mut self) {
        self.timer.settle(now_ms());
    }

    // ── Subject commands ─────────────────────────────────────────────

    /// Add a subject, picking the first unused palette color. Returns the
    /// new subject's id.
    pub fn add_subject(&mut self, name: impl Into<String>, emphasis: u8) -> String {
        let subject = Subject::new(name, emphasis, self.config.next_color());
        let id = subject.id.clone();
        self.config.subjects.push(subject);
        self.recalculate_allocations();
        self.emit(Event::ConfigChanged { at: Utc::now() });
        id
    }

    /// Remove a subject by id, clamping the current-subject pointer back
    /// into range. Returns false if the id was unknown.
    pub fn remove_subject(&mut self, id: &str) -> bool {
        let before = self.config.subjects.len();
        self.config.subjects.retain(|s| s.id != id);
        if self.config.subjects.len() == before {
            return false;
        }
        self.cycle.clamp_index(self.config.subjects.len());
        self.recalculate_allocations();
        self.emit(Event::ConfigChanged { at: Utc::now() });
        true
    }

    /// Rename, re-weight or recolor a subject. Returns false if the id was
    /// unknown.
    pub fn update_subject(
        &mut self,
        id: &str,
        name: Option<&str>,
        emphasis: Option<u8>,
        color: Option<&str>,
    ) -> bool {
        let Some(subject) = self.config.subjects.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if let Some(name) = name {
            subject.name = name.to_string();
        }
        if let Some(emphasis) = emphasis {
            subject.emphasis = emphasis.clamp(1, 10);
        }
        if let Some(color) = color {
            subject.color = color.to_string();
        }
        self.recalculate_allocations();
        self.emit(Event::ConfigChanged { at: Utc::now() });
        true
    }

    /// Manually select the active subject. Only permitted while idle; in
    /// continuous mode the idle duration resyncs to the new subject's
    /// remaining allocation (informational no-op in pomodoro mode).
    pub fn switch_subject(&mut self, index: usize) -> Option<Event> {
        if self.timer.status != TimerStatus::Idle || index >= self.config.subjects.len() {
            return None;
        }
        self.cycle.current_subject_index = index;
        if self.config.settings.variant == TimerVariant::Continuous {
            self.resync_idle_duration();
        }
        let subject_id = self.config.subjects[index].id.clone();
        Some(self.emit(Event::SubjectSwitched {
            index,
            subject_id,
            at: Utc::now(),
        }))
    }

    // ── Config commands ──────────────────────────────────────────────

    /// Set one weekday's hour budget and recompute allocations.
    pub fn set_hours(&mut self, day: chrono::Weekday, hours: f64) {
        self.config.weekly_hours.set(day, hours);
        self.recalculate_allocations();
        self.emit(Event::ConfigChanged { at: Utc::now() });
    }

    /// Replace the timer settings.
    ///
    /// While idle the displayed/next duration recomputes immediately; an
    /// in-progress run keeps its duration untouched.
    pub fn update_settings(&mut self, settings: TimerSettings) {
        self.config.settings = settings;
        if self.timer.status == TimerStatus::Idle {
            if self.config.settings.variant == TimerVariant::Continuous {
                self.timer.mode = TimerMode::Focus;
            }
            self.timer.duration_ms = self.next_run_duration_ms();
        }
        self.emit(Event::ConfigChanged { at: Utc::now() });
    }

    /// Recompute today's allocations, preserving completed time by subject
    /// id, and resync the idle duration in continuous mode.
    pub fn recalculate_allocations(&mut self) {
        let fresh = calc_allocations(&self.config.subjects, self.today_hours());
        self.cycle.subject_progress = merge_allocations(fresh, &self.cycle.subject_progress);
        self.cycle.clamp_index(self.config.subjects.len());
        if self.timer.status == TimerStatus::Idle
            && self.config.settings.variant == TimerVariant::Continuous
        {
            self.resync_idle_duration();
        }
    }

    // ── Reconciliation adoption points ───────────────────────────────

    /// Adopt a remote configuration wholesale (remote is authority for
    /// config) and recompute allocations against it.
    pub fn replace_config(&mut self, config: CycleConfig) {
        self.config = config;
        self.cycle.clamp_index(self.config.subjects.len());
        self.recalculate_allocations();
        self.emit(Event::ConfigChanged { at: Utc::now() });
    }

    /// Adopt a remote runtime snapshot wholesale. The stale-running
    /// correction and the idle-duration resync keep an adopted snapshot
    /// internally self-consistent even if it was captured mid-run.
    pub fn replace_runtime(&mut self, snapshot: RuntimeSnapshot) {
        self.replace_runtime_at(snapshot, now_ms());
    }

    pub fn replace_runtime_at(&mut self, snapshot: RuntimeSnapshot, now_ms: u64) {
        let RuntimeSnapshot { mut timer, cycle } = snapshot;
        timer.settle(now_ms);
        self.timer = timer;
        self.cycle = cycle;
        self.cycle.clamp_index(self.config.subjects.len());
        self.resync_idle_duration();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn emit(&mut self, event: Event) -> Event {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        event
    }

    fn hours_for(&self, date: NaiveDate) -> f64 {
        use chrono::Datelike;
        self.config.weekly_hours.hours_for(date.weekday())
    }

    /// Duration for the next run from the current subject/mode.
    fn next_run_duration_ms(&self) -> u64 {
        match self.config.settings.variant {
            TimerVariant::Continuous => self
                .cycle
                .current()
                .map(|p| p.run_duration_ms())
                .unwrap_or(FALLBACK_RUN_MS),
            TimerVariant::Pomodoro => self.config.settings.mode_duration_ms(self.timer.mode),
        }
    }

    fn resync_idle_duration(&mut self) {
        if self.timer.status == TimerStatus::Idle {
            self.timer.duration_ms = self.next_run_duration_ms();
        }
    }

    /// A stored cycle date other than today discards yesterday's progress:
    /// allocations are recomputed from scratch, not merged.
    fn roll_over_if_new_day(&mut self, today: NaiveDate) {
        if self.cycle.cycle_date == today {
            return;
        }
        self.cycle.cycle_date = today;
        self.cycle.completed_cycles = 0;
        self.cycle.subject_progress =
            calc_allocations(&self.config.subjects, self.hours_for(today));
        self.cycle.clamp_index(self.config.subjects.len());
    }

    /// Continuous-variant completion: next subject, or a fresh cycle when
    /// every allocation is exhausted. Returns (next mode, auto-started).
    fn advance_subject(&mut self, blocks: u32, today: NaiveDate) -> (TimerMode, bool) {
        let all_done = !self.cycle.subject_progress.is_empty()
            && self.cycle.subject_progress.iter().all(|p| p.is_exhausted());

        if all_done {
            let fresh = calc_allocations(&self.config.subjects, self.hours_for(today));
            let first_duration = fresh
                .first()
                .map(|p| p.allocated_ms())
                .unwrap_or(FALLBACK_RUN_MS);
            self.cycle.current_subject_index = 0;
            self.cycle.subject_progress = fresh;
            self.cycle.completed_cycles += 1;
            self.timer = TimerState {
                status: TimerStatus::Idle,
                mode: TimerMode::Focus,
                started_at_ms: None,
                accumulated_ms: 0,
                duration_ms: first_duration,
                completed_blocks: blocks,
            };
            let completed_cycles = self.cycle.completed_cycles;
            self.emit(Event::CycleCompleted {
                completed_cycles,
                at: Utc::now(),
            });
            return (TimerMode::Focus, false);
        }

        let subject_count = self.config.subjects.len();
        let next_index = if subject_count == 0 {
            0
        } else {
            (self.cycle.current_subject_index + 1) % subject_count
        };
        self.cycle.current_subject_index = next_index;
        let next_duration = self
            .cycle
            .subject_progress
            .get(next_index)
            .map(|p| p.run_duration_ms())
            .unwrap_or(FALLBACK_RUN_MS);
        self.timer = TimerState {
            status: TimerStatus::Idle,
            mode: TimerMode::Focus,
            started_at_ms: None,
            accumulated_ms: 0,
            duration_ms: next_duration,
            completed_blocks: blocks,
        };
        (TimerMode::Focus, false)
    }

    /// Pomodoro-variant completion: pick the next mode from the long-break
    /// cadence and honor the auto-start flags. Returns (next mode,
    /// auto-started).
    fn advance_mode(
        &mut self,
        finished_mode: TimerMode,
        blocks: u32,
        now_ms: u64,
    ) -> (TimerMode, bool) {
        let settings = &self.config.settings;
        let next_mode = if finished_mode == TimerMode::Focus {
            if blocks % settings.long_break_interval.max(1) == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            }
        } else {
            TimerMode::Focus
        };

        let auto_start = if next_mode == TimerMode::Focus {
            settings.auto_start_focus
        } else {
            settings.auto_start_breaks
        };

        self.timer = TimerState {
            status: if auto_start {
                TimerStatus::Running
            } else {
                TimerStatus::Idle
            },
            mode: next_mode,
            started_at_ms: auto_start.then_some(now_ms),
            accumulated_ms: 0,
            duration_ms: settings.mode_duration_ms(next_mode),
            completed_blocks: blocks,
        };
        (next_mode, auto_start)
    }
}
