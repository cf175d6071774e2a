use std::io::Write;

use clap::Subcommand;
use pomodoro_core::events::Event;
use pomodoro_core::storage::Database;
use pomodoro_core::timer::{format_time, IntervalTicks, TimerCommand, TimerRunner};
use pomodoro_core::{Config, SessionType, SettingsStore, TimerEngine, TimerSettings, TimerState};

use super::{print_json, CliResult, Context};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown in the foreground (Ctrl+C cancels and records it)
    Run {
        /// Custom length in minutes instead of the configured duration
        #[arg(long)]
        minutes: Option<i64>,
        /// Session type to start with (work or break)
        #[arg(long = "type")]
        session_type: Option<SessionType>,
        /// Number of sessions to run back to back
        #[arg(long, default_value = "1")]
        sessions: u32,
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Print the saved timer state as JSON
    Status,
    /// Reset to a fresh work session
    Reset,
}

fn load_engine(db: &Database, settings: &TimerSettings) -> TimerEngine {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        match serde_json::from_str::<TimerEngine>(&json) {
            // Only idle engines are saved; anything else is a leftover from a crash.
            Ok(engine) if engine.state() == TimerState::Idle => return engine,
            Ok(_) => tracing::warn!("discarding interrupted timer state"),
            Err(e) => tracing::warn!(error = %e, "discarding unreadable timer state"),
        }
    }
    TimerEngine::new(settings.clone())
}

fn save_engine(db: &Database, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

fn print_event(event: &Event, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    let mut out = std::io::stdout().lock();
    match event {
        Event::TimerStarted {
            session_type,
            duration_secs,
            ..
        } => writeln!(out, "{session_type} session started ({})", format_time(*duration_secs))?,
        Event::TimerTicked { remaining_secs, .. } => {
            write!(out, "\r{} remaining ", format_time(*remaining_secs))?;
            out.flush()?;
        }
        Event::SessionCompleted {
            session_type,
            next_session_type,
            next_duration_secs,
            ..
        } => writeln!(
            out,
            "\n{session_type} session complete; next: {next_session_type} ({})",
            format_time(*next_duration_secs)
        )?,
        Event::SessionCancelled { record, .. } => writeln!(
            out,
            "\n{} session cancelled after {} min",
            record.session_type, record.actual_duration_minutes
        )?,
        Event::SessionSaved { outcome } => {
            writeln!(out, "saved session {} (remote: {:?})", outcome.id, outcome.remote)?
        }
        Event::SessionSaveFailed { id, error } => {
            writeln!(out, "failed to save session {id}: {error}")?
        }
        _ => {}
    }
    Ok(())
}

async fn run_foreground(
    ctx: &Context,
    engine: TimerEngine,
    sessions: u32,
    json: bool,
) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let (runner, handle, mut events) =
        TimerRunner::new(engine, ctx.store.clone(), ctx.owner(), IntervalTicks::every_second());
    let task = tokio::spawn(runner.run());
    handle.send(TimerCommand::Start).await;

    let mut completed = 0;
    let mut interrupted = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event, json)?;
                if let Event::SessionCompleted { .. } = event {
                    completed += 1;
                    let next = if completed >= sessions {
                        TimerCommand::Shutdown
                    } else {
                        TimerCommand::Start
                    };
                    handle.send(next).await;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                handle.send(TimerCommand::Cancel).await;
                handle.send(TimerCommand::Shutdown).await;
            }
        }
    }

    Ok(task.await?)
}

pub async fn run(action: TimerAction, config: &Config) -> CliResult {
    let ctx = Context::open(config)?;
    let settings = ctx.db.get();

    match action {
        TimerAction::Run {
            minutes,
            session_type,
            sessions,
            json,
        } => {
            let mut engine = load_engine(&ctx.db, &settings);
            engine.apply_settings(settings)?;
            if let Some(session_type) = session_type {
                engine.set_session_type(session_type)?;
            }
            if let Some(minutes) = minutes {
                engine.set_custom_time(minutes)?;
            }
            let engine = run_foreground(&ctx, engine, sessions.max(1), json).await?;
            save_engine(&ctx.db, &engine)?;
        }
        TimerAction::Status => {
            let engine = load_engine(&ctx.db, &settings);
            print_json(&engine.snapshot())?;
        }
        TimerAction::Reset => {
            let engine = TimerEngine::new(settings);
            save_engine(&ctx.db, &engine)?;
            print_json(&engine.snapshot())?;
        }
    }
    Ok(())
}
