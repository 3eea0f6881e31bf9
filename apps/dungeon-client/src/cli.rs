use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dungeon_sdk::DEFAULT_API_URL;

use crate::telemetry::{LogConfig, LogLevel, LogSink};

#[derive(Parser, Debug)]
#[command(
    name = "dungeon-client",
    about = "Play a dungeon-master table game from the terminal",
    author,
    version
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "DUNGEON_API_URL",
        default_value = DEFAULT_API_URL,
        help = "Base URL of the game backend"
    )]
    pub api_url: String,

    #[arg(
        long,
        global = true,
        env = "DUNGEON_POLL_INTERVAL_SECS",
        default_value_t = 10,
        value_name = "SECS",
        help = "Pause between checksum polls"
    )]
    pub poll_interval_secs: u64,

    #[arg(
        long,
        global = true,
        env = "DUNGEON_HTTP_TIMEOUT_SECS",
        default_value_t = 30,
        value_name = "SECS",
        help = "Per-request HTTP timeout"
    )]
    pub http_timeout_secs: u64,

    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        global = true,
        env = "DUNGEON_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        global = true,
        env = "DUNGEON_LOG_FILE",
        help = "Write logs to the specified file instead of stderr"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            sink: self
                .file
                .clone()
                .map_or(LogSink::Stderr, LogSink::File),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Join a game and play interactively
    Play(PlayArgs),
    /// Print a raw backend view of a game
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[arg(long = "game", value_name = "GAME_ID")]
    pub game_id: String,

    #[arg(long = "player", value_name = "NAME")]
    pub player_name: String,

    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        help = "Play against a local in-memory backend instead of --api-url"
    )]
    pub sandbox: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(value_enum)]
    pub view: InspectView,

    #[arg(long = "game", value_name = "GAME_ID")]
    pub game_id: String,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum InspectView {
    Players,
    Npcs,
    Locations,
    History,
    Checksum,
}
