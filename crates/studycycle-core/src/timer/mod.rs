mod engine;
mod state;

pub use engine::CycleEngine;
pub use state::{
    CycleState, RuntimeSnapshot, SubjectProgress, TimerMode, TimerState, TimerStatus,
};

pub(crate) use state::now_ms;
