//! Validate seed data without touching the database.

use std::path::Path;

use tracing::{error, info, warn};

use pharmpilot_seed::{SeedCatalog, validate_catalog};

use super::CommandError;

/// Load and validate a catalog, logging every problem found.
///
/// # Errors
///
/// Returns `CommandError::Data` if the catalog cannot be loaded or has errors.
pub async fn run(path: Option<&Path>) -> Result<(), CommandError> {
    let catalog = SeedCatalog::load(path).await?;
    info!(
        suppliers = catalog.suppliers.len(),
        categories = catalog.categories.len(),
        report_categories = catalog.report_categories.len(),
        items = catalog.items.len(),
        "Parsed seed data"
    );

    let report = validate_catalog(&catalog);
    for warning in &report.warnings {
        warn!("  - {warning}");
    }
    for err in &report.errors {
        error!("  - {err}");
    }

    report.into_result()?;
    info!("Seed data is valid");
    Ok(())
}
