use clap::Args;
use pomodoro_core::Config;

use super::{print_json, CliResult, Context};

#[derive(Args)]
pub struct StatsArgs {
    /// Totals over the remote copy only (requires sign-in and remote sync)
    #[arg(long)]
    remote: bool,
}

pub async fn run(args: StatsArgs, config: &Config) -> CliResult {
    let ctx = Context::open(config)?;
    let owner = ctx.owner();

    if args.remote {
        let owner = owner.ok_or("not signed in; run `auth login <owner-id>` first")?;
        let stats = ctx.store.remote_stats(&owner).await?;
        print_json(&stats)?;
    } else {
        let stats = ctx.store.stats(owner.as_deref()).await;
        print_json(&stats)?;
    }
    Ok(())
}
