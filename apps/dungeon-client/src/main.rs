mod cli;
mod command;
mod inspect;
mod play;
mod render;
mod sandbox;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dungeon_sdk::{DungeonClient, GameBackend};
use dungeon_sync::{SyncConfig, SyncController};
use tracing::info;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    telemetry::init(&cli.logging.to_config()).context("initializing logging")?;

    match &cli.command {
        Command::Play(args) => {
            let backend: Arc<dyn GameBackend> = if args.sandbox {
                sandbox::seeded(&args.game_id, &args.player_name).await
            } else {
                Arc::new(http_backend(&cli)?)
            };
            let config = SyncConfig {
                poll_interval: cli.poll_interval(),
            };
            info!(
                target = "dungeon.client",
                sandbox = args.sandbox,
                api_url = %cli.api_url,
                poll_interval_ms = config.poll_interval.as_millis() as u64,
                "starting play session"
            );
            let controller = SyncController::new(backend, config);
            play::run(controller, &args.game_id, &args.player_name).await
        }
        Command::Inspect(args) => {
            let backend = http_backend(&cli)?;
            let output = inspect::fetch(&backend, args.view, &args.game_id).await?;
            println!("{output}");
            Ok(())
        }
    }
}

fn http_backend(cli: &Cli) -> anyhow::Result<DungeonClient> {
    DungeonClient::with_timeout(&cli.api_url, cli.http_timeout())
        .with_context(|| format!("connecting to {}", cli.api_url))
}
