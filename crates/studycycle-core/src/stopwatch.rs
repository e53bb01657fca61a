//! Free stopwatch, independent of the cycle.
//!
//! Counts up with the same segment-based wall-clock accounting as the
//! countdown timer. Stopping produces a session record unless the elapsed
//! time rounds below one second.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::session::FocusSession;
use crate::timer::{now_ms, TimerMode, TimerStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopwatch {
    status: TimerStatus,
    label: String,
    started_at_ms: Option<u64>,
    accumulated_ms: u64,
    session_started_at: Option<DateTime<Utc>>,
}

impl Stopwatch {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            status: TimerStatus::Idle,
            label: label.into(),
            started_at_ms: None,
            accumulated_ms: 0,
            session_started_at: None,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms_at(now_ms())
    }

    pub fn elapsed_ms_at(&self, now_ms: u64) -> u64 {
        let running = self
            .started_at_ms
            .map(|t| now_ms.saturating_sub(t))
            .unwrap_or(0);
        self.accumulated_ms.saturating_add(running)
    }

    pub fn start(&mut self) -> bool {
        self.start_at(now_ms(), Utc::now())
    }

    pub fn start_at(&mut self, now_ms: u64, now: DateTime<Utc>) -> bool {
        if self.status != TimerStatus::Idle {
            return false;
        }
        self.status = TimerStatus::Running;
        self.started_at_ms = Some(now_ms);
        self.accumulated_ms = 0;
        self.session_started_at = Some(now);
        true
    }

    pub fn pause(&mut self) -> bool {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now_ms: u64) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        if let Some(started) = self.started_at_ms.take() {
            self.accumulated_ms = self
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(started));
        }
        self.status = TimerStatus::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        self.resume_at(now_ms())
    }

    pub fn resume_at(&mut self, now_ms: u64) -> bool {
        if self.status != TimerStatus::Paused {
            return false;
        }
        self.status = TimerStatus::Running;
        self.started_at_ms = Some(now_ms);
        true
    }

    /// Discard the run without recording anything.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.started_at_ms = None;
        self.accumulated_ms = 0;
        self.session_started_at = None;
    }

    pub fn stop_and_save(&mut self) -> Option<FocusSession> {
        self.stop_and_save_at(now_ms(), Utc::now())
    }

    /// Stop the stopwatch and build a session record from the elapsed time.
    ///
    /// Runs shorter than one second are dropped. The stopwatch always
    /// returns to idle, whether or not a record was produced.
    pub fn stop_and_save_at(&mut self, now_ms: u64, now: DateTime<Utc>) -> Option<FocusSession> {
        if self.status == TimerStatus::Idle {
            return None;
        }
        self.pause_at(now_ms);
        let elapsed = self.accumulated_ms;
        let started_at = self.session_started_at.take();
        self.reset();

        if elapsed < 1_000 {
            return None;
        }
        let started_at = started_at?;
        Some(FocusSession {
            id: None,
            subject_name: self.label.clone(),
            subject_id: slug(&self.label),
            started_at,
            ended_at: now,
            duration_seconds: (elapsed as f64 / 1000.0).round() as u64,
            mode: TimerMode::Focus,
            completed: true,
            date: now.with_timezone(&Local).date_naive(),
        })
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new("Stopwatch")
    }
}

fn slug(label: &str) -> String {
    let mut slug = String::new();
    for c in label.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "stopwatch".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn counts_up_across_pause_segments() {
        let mut sw = Stopwatch::new("Reading");
        sw.start_at(0, utc(0));
        sw.pause_at(30_000);
        assert_eq!(sw.elapsed_ms_at(999_999), 30_000);
        sw.resume_at(60_000);
        assert_eq!(sw.elapsed_ms_at(75_000), 45_000);
    }

    #[test]
    fn stop_produces_a_record() {
        let mut sw = Stopwatch::new("Deep Work");
        sw.start_at(0, utc(0));
        let session = sw.stop_and_save_at(125_400, utc(125)).unwrap();
        assert_eq!(session.subject_name, "Deep Work");
        assert_eq!(session.subject_id, "deep-work");
        assert_eq!(session.duration_seconds, 125);
        assert_eq!(session.started_at, utc(0));
        assert_eq!(sw.status(), TimerStatus::Idle);
    }

    #[test]
    fn sub_second_runs_are_dropped() {
        let mut sw = Stopwatch::new("Blip");
        sw.start_at(0, utc(0));
        assert!(sw.stop_and_save_at(500, utc(1)).is_none());
        // The stopwatch still resets.
        assert_eq!(sw.status(), TimerStatus::Idle);
        assert_eq!(sw.elapsed_ms_at(10_000), 0);
    }

    #[test]
    fn one_second_run_is_recorded() {
        let mut sw = Stopwatch::new("Quick");
        sw.start_at(0, utc(0));
        let session = sw.stop_and_save_at(1_000, utc(1)).unwrap();
        assert_eq!(session.duration_seconds, 1);
        assert_eq!(sw.status(), TimerStatus::Idle);
    }

    #[test]
    fn stop_while_idle_is_a_noop() {
        let mut sw = Stopwatch::default();
        assert!(sw.stop_and_save_at(5_000, utc(5)).is_none());
    }

    #[test]
    fn reset_discards_without_recording() {
        let mut sw = Stopwatch::new("Reading");
        sw.start_at(0, utc(0));
        sw.reset();
        assert!(sw.stop_and_save_at(60_000, utc(60)).is_none());
    }

    #[test]
    fn slug_collapses_punctuation_runs() {
        assert_eq!(slug("Deep Work!"), "deep-work");
        assert_eq!(slug("  Math -- Review  "), "math-review");
        assert_eq!(slug("  "), "stopwatch");
    }
}
