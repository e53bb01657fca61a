//! Cycle configuration: subjects, weekly hour budgets and timer settings.
//!
//! This is the document synced through the remote store's `cycle-config`
//! resource and mirrored into the local cache blob. Field names follow the
//! wire format (camelCase), with per-field serde defaults so documents from
//! older writers deserialize cleanly.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::TimerMode;

/// Palette for newly created subjects. `CycleConfig::next_color` picks the
/// first entry not already in use.
pub const SUBJECT_COLORS: [&str; 12] = [
    "#8b5cf6", "#3b82f6", "#ef4444", "#f59e0b", "#10b981", "#ec4899",
    "#6366f1", "#14b8a6", "#f97316", "#06b6d4", "#84cc16", "#a855f7",
];

/// Duration used when a run must start but no allocation entry exists for
/// the current subject.
pub const FALLBACK_RUN_MS: u64 = 60 * 60_000;

/// A study subject with an emphasis weight controlling its proportional
/// share of the daily hour budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    /// Integer weight 1-10, higher = more time.
    pub emphasis: u8,
    pub color: String,
}

impl Subject {
    pub fn new(name: impl Into<String>, emphasis: u8, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            emphasis: emphasis.clamp(1, 10),
            color: color.into(),
        }
    }
}

/// Timer variant.
///
/// Continuous runs each subject's allocated time back to back; pomodoro
/// alternates fixed focus/break blocks independent of allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerVariant {
    Continuous,
    Pomodoro,
}

/// Timer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    #[serde(default = "default_variant")]
    pub variant: TimerVariant,
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// A long break every N completed focus blocks.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_focus: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

impl TimerSettings {
    /// Fixed duration for a pomodoro-variant mode.
    pub fn mode_duration_ms(&self, mode: TimerMode) -> u64 {
        let minutes = match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        };
        u64::from(minutes) * 60_000
    }
}

/// Hour budget per weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHours {
    #[serde(default = "default_weekend_hours")]
    pub sun: f64,
    #[serde(default = "default_weekday_hours")]
    pub mon: f64,
    #[serde(default = "default_weekday_hours")]
    pub tue: f64,
    #[serde(default = "default_weekday_hours")]
    pub wed: f64,
    #[serde(default = "default_weekday_hours")]
    pub thu: f64,
    #[serde(default = "default_weekday_hours")]
    pub fri: f64,
    #[serde(default = "default_saturday_hours")]
    pub sat: f64,
}

impl WeeklyHours {
    pub fn hours_for(&self, day: Weekday) -> f64 {
        match day {
            Weekday::Sun => self.sun,
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
        }
    }

    /// Set the budget for one weekday. Negative values clamp to zero.
    pub fn set(&mut self, day: Weekday, hours: f64) {
        let hours = hours.max(0.0);
        match day {
            Weekday::Sun => self.sun = hours,
            Weekday::Mon => self.mon = hours,
            Weekday::Tue => self.tue = hours,
            Weekday::Wed => self.wed = hours,
            Weekday::Thu => self.thu = hours,
            Weekday::Fri => self.fri = hours,
            Weekday::Sat => self.sat = hours,
        }
    }
}

/// The full synced configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleConfig {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub weekly_hours: WeeklyHours,
    #[serde(default)]
    pub settings: TimerSettings,
}

impl CycleConfig {
    /// First palette color not used by an existing subject.
    pub fn next_color(&self) -> &'static str {
        SUBJECT_COLORS
            .iter()
            .find(|c| !self.subjects.iter().any(|s| s.color == **c))
            .copied()
            .unwrap_or(SUBJECT_COLORS[0])
    }
}

// Default functions
fn default_variant() -> TimerVariant {
    TimerVariant::Continuous
}
fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_weekday_hours() -> f64 {
    8.0
}
fn default_weekend_hours() -> f64 {
    4.0
}
fn default_saturday_hours() -> f64 {
    6.0
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            variant: TimerVariant::Continuous,
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
            auto_start_breaks: false,
            auto_start_focus: false,
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}

impl Default for WeeklyHours {
    fn default() -> Self {
        Self {
            sun: 4.0,
            mon: 8.0,
            tue: 8.0,
            wed: 8.0,
            thu: 8.0,
            fri: 8.0,
            sat: 6.0,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            subjects: Vec::new(),
            weekly_hours: WeeklyHours::default(),
            settings: TimerSettings::default(),
        }
    }
}
