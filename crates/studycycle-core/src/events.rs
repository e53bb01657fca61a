//! Engine events.
//!
//! Every transition in the cycle engine produces an `Event`, returned to the
//! caller and broadcast to subscribers. The session recorder and the sync
//! layer react to these; a caller that wants cross-context notification can
//! forward them over whatever channel the platform offers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A run began from idle.
    Started {
        mode: TimerMode,
        subject_id: Option<String>,
        subject_name: Option<String>,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    Paused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Manual reset; the current run segment is discarded unrecorded.
    Reset {
        at: DateTime<Utc>,
    },
    /// A block finished, naturally or via skip. This is the engine's
    /// "fire the notification now" decision; rendering is the caller's
    /// problem.
    BlockCompleted {
        mode: TimerMode,
        subject_id: Option<String>,
        subject_name: Option<String>,
        /// Planned duration of the finished block. Differs from
        /// `elapsed_ms` when the block was skipped early.
        duration_ms: u64,
        elapsed_ms: u64,
        /// Global completed-focus-block counter after this completion.
        completed_blocks: u32,
        next_mode: TimerMode,
        auto_started: bool,
        at: DateTime<Utc>,
    },
    /// Every subject's allocation is exhausted; a fresh cycle begins.
    CycleCompleted {
        completed_cycles: u32,
        at: DateTime<Utc>,
    },
    SubjectSwitched {
        index: usize,
        subject_id: String,
        at: DateTime<Utc>,
    },
    /// Subjects, weekly hours or timer settings changed.
    ConfigChanged {
        at: DateTime<Utc>,
    },
}
