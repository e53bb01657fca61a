use clap::Subcommand;
use studycycle_core::TimerVariant;

use super::{load_engine, open_sync, persist, print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration as JSON
    Show,
    /// Set the hour budget for one weekday
    Hours {
        /// Weekday name (mon, tue, ... or full name)
        day: String,
        hours: f64,
    },
    /// Update timer settings
    Set {
        /// continuous or pomodoro
        #[arg(long)]
        variant: Option<String>,
        #[arg(long)]
        focus_minutes: Option<u32>,
        #[arg(long)]
        short_break_minutes: Option<u32>,
        #[arg(long)]
        long_break_minutes: Option<u32>,
        #[arg(long)]
        long_break_interval: Option<u32>,
        #[arg(long)]
        auto_start_breaks: Option<bool>,
        #[arg(long)]
        auto_start_focus: Option<bool>,
    },
}

pub fn run(action: ConfigAction) -> CliResult {
    let mut sync = open_sync()?;
    let mut engine = load_engine(&sync);

    match action {
        ConfigAction::Show => print_json(&serde_json::json!({
            "config": engine.config(),
            "todayHours": engine.today_hours(),
        })),
        ConfigAction::Hours { day, hours } => {
            let day: chrono::Weekday = day
                .parse()
                .map_err(|_| format!("unknown weekday: {day}"))?;
            engine.set_hours(day, hours);
            persist(&mut sync, &engine)?;
            print_json(&engine.config().weekly_hours)
        }
        ConfigAction::Set {
            variant,
            focus_minutes,
            short_break_minutes,
            long_break_minutes,
            long_break_interval,
            auto_start_breaks,
            auto_start_focus,
        } => {
            let mut settings = engine.config().settings.clone();
            if let Some(variant) = variant {
                settings.variant = match variant.as_str() {
                    "continuous" => TimerVariant::Continuous,
                    "pomodoro" => TimerVariant::Pomodoro,
                    other => return Err(format!("unknown variant: {other}").into()),
                };
            }
            if let Some(v) = focus_minutes {
                settings.focus_minutes = v;
            }
            if let Some(v) = short_break_minutes {
                settings.short_break_minutes = v;
            }
            if let Some(v) = long_break_minutes {
                settings.long_break_minutes = v;
            }
            if let Some(v) = long_break_interval {
                settings.long_break_interval = v;
            }
            if let Some(v) = auto_start_breaks {
                settings.auto_start_breaks = v;
            }
            if let Some(v) = auto_start_focus {
                settings.auto_start_focus = v;
            }
            engine.update_settings(settings);
            persist(&mut sync, &engine)?;
            print_json(&engine.config().settings)
        }
    }
}
