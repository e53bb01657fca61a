//! Timer and cycle state documents.
//!
//! These are the two halves of the `timer-state` snapshot synced through the
//! remote store and mirrored in the local cache. All elapsed-time accounting
//! is wall-clock based: a running timer carries the epoch-ms timestamp of
//! its last resume and accumulates the prior segments separately, so pause
//! gaps and tab suspension cannot corrupt the math.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

/// Countdown state for the current run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    /// Always `Focus` in the continuous variant.
    pub mode: TimerMode,
    /// Epoch ms of the last start/resume. `Some` iff running.
    pub started_at_ms: Option<u64>,
    /// Elapsed ms accumulated before the current running segment.
    pub accumulated_ms: u64,
    /// Total duration of the current run.
    pub duration_ms: u64,
    /// Monotonic count of completed focus blocks. Drives the pomodoro
    /// long-break cadence and doubles as the session recorder's
    /// change-detection signal.
    #[serde(default)]
    pub completed_blocks: u32,
}

impl TimerState {
    pub fn idle(mode: TimerMode, duration_ms: u64) -> Self {
        Self {
            status: TimerStatus::Idle,
            mode,
            started_at_ms: None,
            accumulated_ms: 0,
            duration_ms,
            completed_blocks: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Total elapsed time of the current run at `now_ms`.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .started_at_ms
            .map(|t| now_ms.saturating_sub(t))
            .unwrap_or(0);
        self.accumulated_ms.saturating_add(running)
    }

    /// Remaining time of the current run at `now_ms`. Idle timers show the
    /// full duration.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        if self.status == TimerStatus::Idle {
            return self.duration_ms;
        }
        self.duration_ms.saturating_sub(self.elapsed_ms(now_ms))
    }

    /// Stale-running correction.
    ///
    /// A `running` state loaded from any snapshot cannot be trusted: the
    /// resume timestamp may be arbitrarily old. Converts to `paused` with
    /// the elapsed time clamped to the run duration. No-op on idle/paused
    /// states, so it is safe to apply unconditionally before a snapshot
    /// goes live or leaves the process.
    pub fn settle(&mut self, now_ms: u64) {
        if self.status != TimerStatus::Running {
            return;
        }
        if let Some(started) = self.started_at_ms.take() {
            let total = self
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(started));
            self.accumulated_ms = total.min(self.duration_ms);
        }
        self.status = TimerStatus::Paused;
    }
}

/// Per-subject progress for the current day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject_id: String,
    /// Today's budget for this subject, from the allocation calculator.
    pub allocated_minutes: u32,
    pub completed_ms: u64,
    pub blocks_completed: u32,
}

impl SubjectProgress {
    pub fn allocated_ms(&self) -> u64 {
        u64::from(self.allocated_minutes) * 60_000
    }

    pub fn remaining_ms(&self) -> u64 {
        self.allocated_ms().saturating_sub(self.completed_ms)
    }

    pub fn is_exhausted(&self) -> bool {
        self.completed_ms >= self.allocated_ms()
    }

    /// Duration for the next run against this subject: the remaining
    /// allocation, falling back to the full allocation once exhausted so a
    /// finished subject never yields a permanently zero-duration run.
    pub fn run_duration_ms(&self) -> u64 {
        let remaining = self.remaining_ms();
        if remaining > 0 {
            remaining
        } else {
            self.allocated_ms()
        }
    }
}

/// One day's pass through the subject list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleState {
    pub current_subject_index: usize,
    pub subject_progress: Vec<SubjectProgress>,
    /// The day this cycle belongs to; a mismatch with today triggers a
    /// full allocation reset.
    pub cycle_date: NaiveDate,
    #[serde(default)]
    pub completed_cycles: u32,
}

impl CycleState {
    pub fn new(cycle_date: NaiveDate) -> Self {
        Self {
            current_subject_index: 0,
            subject_progress: Vec::new(),
            cycle_date,
            completed_cycles: 0,
        }
    }

    pub fn current(&self) -> Option<&SubjectProgress> {
        self.subject_progress.get(self.current_subject_index)
    }

    /// Clamp the subject pointer into range after a deletion or an adopted
    /// snapshot with a stale index.
    pub fn clamp_index(&mut self, subject_count: usize) {
        if self.current_subject_index >= subject_count {
            self.current_subject_index = subject_count.saturating_sub(1);
        }
    }
}

/// The `timer-state` wire document: timer plus cycle, snapshotted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub timer: TimerState,
    pub cycle: CycleState,
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
