//! Seed the database with bootstrap accounts and catalog data.
//!
//! # Usage
//!
//! ```bash
//! # Seed from the bundled catalog
//! pp-cli seed
//!
//! # Seed from a custom catalog, replacing stale item-category links
//! pp-cli seed --data ./catalog.yaml --replace-category-links
//!
//! # Run the whole pipeline against an in-memory store
//! pp-cli seed --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `PHARMPILOT_DATABASE_URL` (or `DATABASE_URL`) - required unless `--dry-run`
//! - `APP_SUPER_ADMIN_*`, `APP_ADMIN_*`, `APP_CUSTOMER_*` - bootstrap identities

use std::path::Path;

use tracing::{info, warn};

use pharmpilot_seed::{
    CategoryLinkMode, HashingParams, MemoryStore, PasswordHasher, PgSeedStore, SeedCatalog,
    SeedConfig, SeedError, SeedOptions, SeedReport, SeedStore, config, reconcile,
    validate_catalog,
};

use super::CommandError;

/// Arguments for `pp-cli seed`.
#[derive(Debug, Clone, Default)]
pub struct SeedArgs<'a> {
    /// Catalog file; the bundled catalog when `None`.
    pub data: Option<&'a Path>,
    /// Use an in-memory store instead of `PostgreSQL`.
    pub dry_run: bool,
    /// Replace item-category links on update instead of appending.
    pub replace_category_links: bool,
}

/// Run a seed.
///
/// # Errors
///
/// Returns `CommandError::Seed` for any failure; the store has already been
/// disconnected by then.
pub async fn run(args: SeedArgs<'_>) -> Result<SeedReport, CommandError> {
    let report = seed(&args).await?;
    log_summary(&report, args.dry_run);
    Ok(report)
}

async fn seed(args: &SeedArgs<'_>) -> Result<SeedReport, SeedError> {
    let catalog = SeedCatalog::load(args.data).await?;
    let warnings = validate_catalog(&catalog).into_result()?;
    for warning in &warnings {
        warn!("Seed data: {warning}");
    }

    let seed_config = SeedConfig::from_env()?;
    let options = SeedOptions {
        link_mode: if args.replace_category_links {
            CategoryLinkMode::Replace
        } else {
            CategoryLinkMode::Append
        },
    };

    let (store, params): (Box<dyn SeedStore>, HashingParams) = if args.dry_run {
        info!("Dry run: seeding an in-memory store");
        (Box::new(MemoryStore::new()), HashingParams::insecure_fast())
    } else {
        let database_url = config::database_url()?;
        info!("Connecting to database...");
        let store = PgSeedStore::connect(&database_url)
            .await
            .map_err(SeedError::Connect)?;
        (Box::new(store), HashingParams::default())
    };

    let hasher = match PasswordHasher::new(params) {
        Ok(hasher) => hasher,
        Err(e) => {
            store.disconnect().await;
            return Err(e.into());
        }
    };

    reconcile::run(store.as_ref(), &seed_config, &catalog, &hasher, options).await
}

fn log_summary(report: &SeedReport, dry_run: bool) {
    info!(dry_run, "Seeding complete!");
    info!(
        "  Accounts: {} created, {} already existed",
        report.accounts_created, report.accounts_existing
    );
    info!(
        "  Suppliers: {} created, {} matched",
        report.suppliers_created, report.suppliers_matched
    );
    info!(
        "  Categories: {} created, {} matched",
        report.categories_created, report.categories_matched
    );
    info!(
        "  Report categories: {} created, {} matched",
        report.report_categories_created, report.report_categories_matched
    );
    info!(
        "  Items: {} created, {} updated",
        report.items_created, report.items_updated
    );
    if report.items_without_supplier > 0 {
        warn!(
            "  Items without a supplier link: {}",
            report.items_without_supplier
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_seeds_bundled_catalog() {
        let report = run(SeedArgs {
            dry_run: true,
            ..SeedArgs::default()
        })
        .await
        .unwrap();

        let catalog = SeedCatalog::bundled().unwrap();
        assert_eq!(report.accounts_created, 3);
        assert_eq!(report.suppliers_created, catalog.suppliers.len());
        assert_eq!(report.categories_created, catalog.categories.len());
        assert_eq!(
            report.report_categories_created,
            catalog.report_categories.len()
        );
        assert_eq!(report.items_created, catalog.items.len());
        assert_eq!(report.items_without_supplier, 0);
    }

    #[tokio::test]
    async fn test_missing_data_file_is_a_seed_error() {
        let err = run(SeedArgs {
            data: Some(Path::new("/nonexistent/catalog.yaml")),
            dry_run: true,
            ..SeedArgs::default()
        })
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("Error during seeding: "));
    }
}
