//! Daily allocation calculator.
//!
//! Pure functions: weighted subjects plus today's hour budget in, per-subject
//! minute budgets out. Re-invoked whenever subjects, weights or the weekly
//! hours change; the merge step preserves progress already completed today.

use crate::config::Subject;
use crate::timer::SubjectProgress;

/// Split today's hour budget across subjects proportionally to emphasis.
///
/// `allocated_minutes[i] = round(hours * 60 * emphasis[i] / total_emphasis)`.
/// An empty subject list or a zero weight sum yields an empty allocation,
/// which callers treat as "no timer duration available", not as an error.
pub fn calc_allocations(subjects: &[Subject], hours_today: f64) -> Vec<SubjectProgress> {
    let total_emphasis: u32 = subjects.iter().map(|s| u32::from(s.emphasis)).sum();
    if total_emphasis == 0 {
        return Vec::new();
    }
    let hours_today = hours_today.max(0.0);

    subjects
        .iter()
        .map(|s| SubjectProgress {
            subject_id: s.id.clone(),
            allocated_minutes: ((hours_today * 60.0 * f64::from(s.emphasis))
                / f64::from(total_emphasis))
            .round() as u32,
            completed_ms: 0,
            blocks_completed: 0,
        })
        .collect()
}

/// Merge a fresh allocation set with existing progress by subject id.
///
/// Completed time and block counts survive a recalculation; subjects no
/// longer present are dropped and new subjects start zeroed.
pub fn merge_allocations(
    fresh: Vec<SubjectProgress>,
    existing: &[SubjectProgress],
) -> Vec<SubjectProgress> {
    fresh
        .into_iter()
        .map(|mut entry| {
            if let Some(prev) = existing.iter().find(|e| e.subject_id == entry.subject_id) {
                entry.completed_ms = prev.completed_ms;
                entry.blocks_completed = prev.blocks_completed;
            }
            entry
        })
        .collect()
}
