//! Completed-session records.
//!
//! A session is recorded when a focus block completes, never on reset.
//! The recorder watches engine events: it captures the session candidate on
//! start, discards it on reset, and flushes it on completion with the block's
//! planned duration.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::timer::TimerMode;

/// A finished focus (or stopwatch) session, as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    /// Assigned by the remote store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub subject_name: String,
    pub subject_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub mode: TimerMode,
    pub completed: bool,
    /// Local calendar date the session counts toward.
    pub date: NaiveDate,
}

impl FocusSession {
    /// Build a record directly from a completion event, deriving the start
    /// time from the elapsed span. Used where the matching start event was
    /// observed by a different process. The recorded duration is the
    /// block's planned duration, as with the in-process recorder, so a
    /// skipped block still records its planned length.
    pub fn from_completion(event: &Event) -> Option<Self> {
        let Event::BlockCompleted {
            mode: TimerMode::Focus,
            subject_id,
            subject_name,
            duration_ms,
            elapsed_ms,
            at,
            ..
        } = event
        else {
            return None;
        };
        Some(FocusSession {
            id: None,
            subject_name: subject_name.clone().unwrap_or_else(|| "Focus".to_string()),
            subject_id: subject_id.clone().unwrap_or_default(),
            started_at: *at - chrono::Duration::milliseconds(*elapsed_ms as i64),
            ended_at: *at,
            duration_seconds: (*duration_ms as f64 / 1000.0).round() as u64,
            mode: TimerMode::Focus,
            completed: true,
            date: at.with_timezone(&Local).date_naive(),
        })
    }
}

#[derive(Debug, Clone)]
struct PendingSession {
    subject_id: String,
    subject_name: String,
    started_at: DateTime<Utc>,
    planned_ms: u64,
}

/// Turns the engine's event stream into [`FocusSession`] records.
///
/// Only focus blocks produce sessions; breaks and resets do not. The
/// recorded duration is the block's planned duration captured at start, so
/// pause gaps do not inflate the record and a skipped block still records
/// its planned length.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    pending: Option<PendingSession>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one engine event; returns a session ready to persist when a
    /// focus block completed.
    pub fn observe(&mut self, event: &Event) -> Option<FocusSession> {
        match event {
            Event::Started {
                mode: TimerMode::Focus,
                subject_id,
                subject_name,
                duration_ms,
                at,
            } => {
                if self.pending.is_none() {
                    self.pending = Some(PendingSession {
                        subject_id: subject_id.clone().unwrap_or_default(),
                        subject_name: subject_name
                            .clone()
                            .unwrap_or_else(|| "Focus".to_string()),
                        started_at: *at,
                        planned_ms: *duration_ms,
                    });
                }
                None
            }
            Event::Reset { .. } => {
                self.pending = None;
                None
            }
            Event::BlockCompleted {
                mode: TimerMode::Focus,
                at,
                ..
            } => {
                let pending = self.pending.take()?;
                Some(FocusSession {
                    id: None,
                    subject_name: pending.subject_name,
                    subject_id: pending.subject_id,
                    started_at: pending.started_at,
                    ended_at: *at,
                    duration_seconds: (pending.planned_ms as f64 / 1000.0).round() as u64,
                    mode: TimerMode::Focus,
                    completed: true,
                    date: at.with_timezone(&Local).date_naive(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn started(secs: i64) -> Event {
        Event::Started {
            mode: TimerMode::Focus,
            subject_id: Some("math".into()),
            subject_name: Some("Math".into()),
            duration_ms: 1_500_000,
            at: at(secs),
        }
    }

    fn completed(secs: i64, elapsed_ms: u64) -> Event {
        Event::BlockCompleted {
            mode: TimerMode::Focus,
            subject_id: Some("math".into()),
            subject_name: Some("Math".into()),
            duration_ms: 1_500_000,
            elapsed_ms,
            completed_blocks: 1,
            next_mode: TimerMode::Focus,
            auto_started: false,
            at: at(secs),
        }
    }

    #[test]
    fn records_completed_focus_block() {
        let mut recorder = SessionRecorder::new();
        assert!(recorder.observe(&started(0)).is_none());
        let session = recorder.observe(&completed(1500, 1_500_000)).unwrap();
        assert_eq!(session.subject_id, "math");
        assert_eq!(session.subject_name, "Math");
        assert_eq!(session.duration_seconds, 1500);
        assert_eq!(session.started_at, at(0));
        assert_eq!(session.ended_at, at(1500));
        assert!(session.completed);
        assert!(session.id.is_none());
    }

    #[test]
    fn reset_discards_the_pending_session() {
        let mut recorder = SessionRecorder::new();
        recorder.observe(&started(0));
        recorder.observe(&Event::Reset { at: at(10) });
        assert!(recorder.observe(&completed(20, 20_000)).is_none());
    }

    #[test]
    fn break_events_do_not_record() {
        let mut recorder = SessionRecorder::new();
        recorder.observe(&Event::Started {
            mode: TimerMode::ShortBreak,
            subject_id: None,
            subject_name: None,
            duration_ms: 300_000,
            at: at(0),
        });
        assert!(recorder
            .observe(&Event::BlockCompleted {
                mode: TimerMode::ShortBreak,
                subject_id: None,
                subject_name: None,
                duration_ms: 300_000,
                elapsed_ms: 300_000,
                completed_blocks: 1,
                next_mode: TimerMode::Focus,
                auto_started: false,
                at: at(300),
            })
            .is_none());
    }

    #[test]
    fn resume_does_not_restart_the_capture() {
        let mut recorder = SessionRecorder::new();
        recorder.observe(&started(0));
        // A second Started (auto-start chains emit them) keeps the original.
        recorder.observe(&started(600));
        let session = recorder.observe(&completed(1500, 1_500_000)).unwrap();
        assert_eq!(session.started_at, at(0));
        assert_eq!(session.duration_seconds, 1500);
    }

    #[test]
    fn skipped_block_records_its_planned_duration() {
        let mut recorder = SessionRecorder::new();
        recorder.observe(&started(0));
        // Skipped after 5 minutes of a 25-minute block.
        let session = recorder.observe(&completed(300, 300_000)).unwrap();
        assert_eq!(session.duration_seconds, 1500);
        assert_eq!(session.ended_at, at(300));
    }

    #[test]
    fn from_completion_derives_the_start_time() {
        let session = FocusSession::from_completion(&completed(1500, 1_500_000)).unwrap();
        assert_eq!(session.started_at, at(0));
        assert_eq!(session.ended_at, at(1500));
        assert_eq!(session.duration_seconds, 1500);
        assert!(FocusSession::from_completion(&Event::Reset { at: at(0) }).is_none());
    }

    #[test]
    fn from_completion_records_planned_duration_for_skipped_blocks() {
        // A 480-minute block skipped 5 minutes in.
        let event = Event::BlockCompleted {
            mode: TimerMode::Focus,
            subject_id: Some("math".into()),
            subject_name: Some("Math".into()),
            duration_ms: 480 * 60_000,
            elapsed_ms: 5 * 60_000,
            completed_blocks: 1,
            next_mode: TimerMode::Focus,
            auto_started: false,
            at: at(300),
        };
        let session = FocusSession::from_completion(&event).unwrap();
        assert_eq!(session.duration_seconds, 480 * 60);
        assert_eq!(session.started_at, at(0));
        assert_eq!(session.ended_at, at(300));
    }

    #[test]
    fn session_wire_format_is_snake_case() {
        let session = FocusSession {
            id: None,
            subject_name: "Math".into(),
            subject_id: "math".into(),
            started_at: at(0),
            ended_at: at(60),
            duration_seconds: 60,
            mode: TimerMode::Focus,
            completed: true,
            date: NaiveDate::from_ymd_opt(2026, 8, 28).unwrap(),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("subject_name").is_some());
        assert!(json.get("duration_seconds").is_some());
        assert_eq!(json["mode"], "focus");
        // Unsaved sessions omit the id entirely.
        assert!(json.get("id").is_none());
    }
}
