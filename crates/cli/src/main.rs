//! PharmPilot CLI - Database seeding and migration tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! pp-cli migrate
//!
//! # Seed bootstrap accounts and the bundled catalog
//! pp-cli seed
//!
//! # Seed from a custom catalog without touching the database
//! pp-cli seed --data ./catalog.yaml --dry-run
//!
//! # Validate a catalog file
//! pp-cli check-data --data ./catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Reconcile bootstrap data (idempotent)
//! - `check-data` - Validate seed data
//!
//! # Logging
//!
//! `RUST_LOG` overrides the default filter. Set `PHARMPILOT_LOG_JSON=1` for
//! JSON log lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;
use commands::seed::SeedArgs;

const DEFAULT_LOG_FILTER: &str = "pharmpilot_seed=info,pharmpilot_cli=info";

#[derive(Parser)]
#[command(name = "pp-cli")]
#[command(author, version, about = "PharmPilot CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed bootstrap accounts, suppliers, categories and items
    Seed {
        /// YAML catalog to seed instead of the bundled one
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Seed an in-memory store instead of the database
        #[arg(long)]
        dry_run: bool,

        /// Make existing items' category links exactly the declared set
        #[arg(long)]
        replace_category_links: bool,
    },
    /// Validate a seed data file without connecting to the database
    CheckData {
        /// YAML catalog to check instead of the bundled one
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("PHARMPILOT_LOG_JSON").is_ok_and(|v| !v.is_empty() && v != "0");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            data,
            dry_run,
            replace_category_links,
        } => {
            commands::seed::run(SeedArgs {
                data: data.as_deref(),
                dry_run,
                replace_category_links,
            })
            .await?;
        }
        Commands::CheckData { data } => commands::check_data::run(data.as_deref()).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seed_flags() {
        let cli = Cli::parse_from([
            "pp-cli",
            "seed",
            "--data",
            "catalog.yaml",
            "--dry-run",
            "--replace-category-links",
        ]);
        match cli.command {
            Commands::Seed {
                data,
                dry_run,
                replace_category_links,
            } => {
                assert_eq!(data, Some(PathBuf::from("catalog.yaml")));
                assert!(dry_run);
                assert!(replace_category_links);
            }
            _ => panic!("expected seed command"),
        }
    }
}
