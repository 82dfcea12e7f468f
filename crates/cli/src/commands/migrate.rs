//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pp-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PHARMPILOT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/seed/migrations/`:
//! ```text
//! migrations/
//! ├── 20250901000001_create_accounts.sql
//! └── 20250901000002_create_catalog.sql
//! ```

use pharmpilot_seed::StoreError;
use pharmpilot_seed::config;
use pharmpilot_seed::store::postgres::{create_pool, run_migrations};

use super::CommandError;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `CommandError::Config` if no database URL is configured and
/// `CommandError::Migrate` if connecting or migrating fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = config::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url)
        .await
        .map_err(StoreError::from)?;

    tracing::info!("Running migrations...");
    let result = run_migrations(&pool).await;
    pool.close().await;
    result?;

    tracing::info!("Migrations complete!");
    Ok(())
}
