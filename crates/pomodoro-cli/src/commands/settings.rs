use clap::Subcommand;
use pomodoro_core::{Config, SettingsStore};

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current timer settings as JSON
    Show,
    /// Change one setting
    Set {
        /// One of: work_duration, break_duration, notifications, vibration, sound
        key: String,
        /// New value (minutes for durations, true/false for toggles)
        value: String,
    },
}

pub fn run(action: SettingsAction, config: &Config) -> CliResult {
    let ctx = Context::open(config)?;
    let mut settings = ctx.db.get();

    match action {
        SettingsAction::Show => print_json(&settings)?,
        SettingsAction::Set { key, value } => {
            match key.as_str() {
                "work_duration" => settings.work_duration_minutes = value.parse()?,
                "break_duration" => settings.break_duration_minutes = value.parse()?,
                "notifications" => settings.enable_notifications = value.parse()?,
                "vibration" => settings.enable_vibration = value.parse()?,
                "sound" => settings.enable_sound = value.parse()?,
                other => return Err(format!("unknown setting: {other}").into()),
            }
            ctx.db.set(&settings)?;
            print_json(&settings)?;
        }
    }
    Ok(())
}
