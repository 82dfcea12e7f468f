//! Subcommand implementations.

pub mod check_data;
pub mod migrate;
pub mod seed;

use thiserror::Error;

use pharmpilot_seed::{ConfigError, DataError, SeedError, StoreError};

/// Errors surfaced by `pp-cli` subcommands. Each maps to exit status 1.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Seeding aborted.
    #[error("Error during seeding: {0}")]
    Seed(#[from] SeedError),

    /// Migrations could not be applied.
    #[error("Migration failed: {0}")]
    Migrate(#[from] StoreError),

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Seed data is unreadable or invalid.
    #[error("Invalid seed data: {0}")]
    Data(#[from] DataError),
}
