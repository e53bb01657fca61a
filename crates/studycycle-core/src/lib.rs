//! # Studycycle Core Library
//!
//! Core engine for a weighted study cycle timer. A CLI binary drives the
//! same library a GUI front end would: subjects carry emphasis weights, a
//! daily hour budget is split across them, and a wall-clock countdown timer
//! works through the resulting allocations one subject at a time.
//!
//! ## Architecture
//!
//! - **Allocation**: pure weighted split of today's hour budget
//! - **Cycle Engine**: wall-clock timer state machine plus subject/mode
//!   coordinator; the caller invokes `tick()` periodically
//! - **Store**: local JSON cache with migrations, debounced remote writes,
//!   startup reconciliation against the remote store
//! - **Sessions**: completed-block records derived from the event stream
//!
//! ## Key Components
//!
//! - [`CycleEngine`]: timer state machine and cycle coordinator
//! - [`SyncService`]: cache/remote persistence coordination
//! - [`SessionRecorder`]: event stream to session records
//! - [`Stopwatch`]: free count-up timer outside the cycle

pub mod allocation;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod stopwatch;
pub mod store;
pub mod timer;

pub use allocation::{calc_allocations, merge_allocations};
pub use config::{
    CycleConfig, Subject, TimerSettings, TimerVariant, FALLBACK_RUN_MS, SUBJECT_COLORS,
};
pub use error::{CacheError, CoreError, Result, StoreError};
pub use events::Event;
pub use session::{FocusSession, SessionRecorder};
pub use stopwatch::Stopwatch;
pub use store::{
    data_dir, CachedState, LocalCache, RemoteStore, SessionStats, SubjectStats, SyncService,
    CACHE_VERSION,
};
pub use timer::{
    CycleEngine, CycleState, RuntimeSnapshot, SubjectProgress, TimerMode, TimerState, TimerStatus,
};
