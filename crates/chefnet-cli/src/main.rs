//! ChefNet CLI - recipes, courses and the pending list from the terminal
//!
//! Works against the backend when one is configured and falls back to the
//! local store when it is not reachable.

mod cli;
mod commands;
mod error;


use chefnet_core::{ChefNetApi, Context, HttpApi, KeyValueStore, LibSqlStore, OfflineApi};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AttendanceCommands, Cli, Commands};
use crate::commands::attendance::{run_attendance, sync_on_startup};
use crate::commands::common::{resolve_config, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::courses::run_courses;
use crate::commands::pending::run_pending;
use crate::commands::recipes::run_recipes;
use crate::commands::session::{run_login, run_logout, run_whoami};
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "chefnet=info,chefnet_core=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = resolve_config(cli.api_url.as_deref(), cli.offline)?;
    let db_path = resolve_db_path(cli.db_path)?;
    let store = LibSqlStore::open(&db_path).await?;
    tracing::debug!(path = %db_path.display(), backend = config.remote_configured(), "Opened local store");

    if config.remote_configured() {
        let api = HttpApi::new(&config)?;
        let ctx = Context::new(config, store, api);
        if !is_attendance_sync(&cli.command) {
            sync_on_startup(&ctx).await;
        }
        dispatch(&ctx, cli.command).await
    } else {
        dispatch(&Context::new(config, store, OfflineApi), cli.command).await
    }
}

const fn is_attendance_sync(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Attendance {
            command: AttendanceCommands::Sync
        }
    )
}

async fn dispatch<S: KeyValueStore, A: ChefNetApi>(
    ctx: &Context<S, A>,
    command: Commands,
) -> Result<(), CliError> {
    match command {
        Commands::Login { user_id, name } => run_login(ctx, &user_id, name).await,
        Commands::Logout => run_logout(ctx).await,
        Commands::Whoami { json } => run_whoami(ctx, json).await,
        Commands::Recipes { command } => run_recipes(ctx, command).await,
        Commands::Courses { command } => run_courses(ctx, command).await,
        Commands::Pending { command } => run_pending(ctx, command).await,
        Commands::Attendance { command } => run_attendance(ctx, command).await,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}
