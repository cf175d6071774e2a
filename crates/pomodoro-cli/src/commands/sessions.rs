use clap::Subcommand;
use pomodoro_core::{Config, CoreError, SessionType};

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List sessions, newest first (local and remote merged)
    List {
        /// Only sessions that ran to completion
        #[arg(long)]
        completed: bool,
        /// Only cancelled sessions
        #[arg(long, conflicts_with = "completed")]
        cancelled: bool,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: String,
    },
    /// Edit a recorded session
    Edit {
        /// Session ID
        id: String,
        #[arg(long)]
        planned: Option<u32>,
        #[arg(long)]
        actual: Option<u32>,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long = "type")]
        session_type: Option<SessionType>,
    },
    /// Delete every remote session of the signed-in owner (local history is kept)
    ClearRemote,
}

pub async fn run(action: SessionsAction, config: &Config) -> CliResult {
    let ctx = Context::open(config)?;
    let owner = ctx.owner();
    let owner = owner.as_deref();

    match action {
        SessionsAction::List {
            completed,
            cancelled,
        } => {
            let sessions = if completed {
                ctx.store.list_completed(owner).await
            } else if cancelled {
                ctx.store.list_cancelled(owner).await
            } else {
                ctx.store.list_all(owner).await
            };
            print_json(&sessions)?;
        }
        SessionsAction::Delete { id } => {
            let outcome = ctx.store.delete(&id, owner).await?;
            print_json(&outcome)?;
        }
        SessionsAction::Edit {
            id,
            planned,
            actual,
            completed,
            session_type,
        } => {
            let mut record = ctx
                .store
                .list_all(owner)
                .await
                .into_iter()
                .find(|r| r.id == id)
                .ok_or_else(|| CoreError::NotFound(format!("session {id}")))?;
            if let Some(planned) = planned {
                record.planned_duration_minutes = planned;
            }
            if let Some(actual) = actual {
                record.actual_duration_minutes = actual;
            }
            if let Some(completed) = completed {
                record.completed = completed;
            }
            if let Some(session_type) = session_type {
                record.session_type = session_type;
            }
            let remote = ctx.store.update(record.clone(), owner).await?;
            print_json(&serde_json::json!({ "session": record, "remote": remote }))?;
        }
        SessionsAction::ClearRemote => {
            let owner = owner.ok_or("not signed in; run `auth login <owner-id>` first")?;
            let remote = ctx.store.clear_remote(owner).await;
            print_json(&remote)?;
        }
    }
    Ok(())
}
