use clap::Subcommand;
use pomodoro_core::Config;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in as an owner; later sessions are mirrored to the remote store
    Login {
        /// Owner ID assigned by the identity provider
        owner_id: String,
    },
    /// Sign out (local history is kept)
    Logout,
    /// Show sign-in and sync status
    Status,
}

pub fn run(action: AuthAction, config: &Config) -> CliResult {
    let ctx = Context::open(config)?;

    match action {
        AuthAction::Login { owner_id } => {
            ctx.store.sign_in(&owner_id)?;
            println!("signed in as {owner_id}");
        }
        AuthAction::Logout => {
            ctx.store.sign_out()?;
            println!("signed out");
        }
        AuthAction::Status => {
            let owner = ctx.owner();
            print_json(&serde_json::json!({
                "signed_in": owner.is_some(),
                "owner_id": owner,
                "remote_enabled": ctx.store.is_synced(),
                "pending_remote_ops": ctx.store.pending_remote_ops(),
            }))?;
        }
    }
    Ok(())
}
