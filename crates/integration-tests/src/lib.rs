//! Integration tests for PharmPilot.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pharmpilot-integration-tests
//! ```
//!
//! The tests drive the full seed pipeline against
//! [`MemoryStore`](pharmpilot_seed::MemoryStore), so no database is needed.
//! This crate only provides shared fixtures.

use pharmpilot_seed::{
    HashingParams, PasswordHasher, SeedCatalog, SeedConfig, SeedError, SeedOptions, SeedReport,
    SeedStore, reconcile,
};

/// Catalog with one supplier, one category, one report category and one item.
pub const SCENARIO_YAML: &str = r"
suppliers:
  - name: Acme
    email: a@x.com
categories:
  - name: Painkiller
report_categories:
  - name: Daily Sales
items:
  - name: Panadol
    supplier_name: Acme
    category_names: [Painkiller]
    price: 10
";

/// Parse a catalog, panicking on malformed fixtures.
#[must_use]
#[allow(clippy::expect_used)]
pub fn catalog(yaml: &str) -> SeedCatalog {
    SeedCatalog::from_yaml(yaml).expect("fixture catalog parses")
}

/// Account configuration using the built-in defaults.
#[must_use]
#[allow(clippy::expect_used)]
pub fn default_config() -> SeedConfig {
    SeedConfig::from_lookup(|_| None).expect("defaults are valid")
}

/// A hasher cheap enough to run in every test.
#[must_use]
#[allow(clippy::expect_used)]
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(HashingParams::insecure_fast()).expect("valid params")
}

/// Reconcile without disconnecting, so the store can be seeded again.
///
/// # Errors
///
/// Propagates the pipeline's `SeedError`.
pub async fn seed_once<S: SeedStore + ?Sized>(
    store: &S,
    config: &SeedConfig,
    catalog: &SeedCatalog,
    options: SeedOptions,
) -> Result<SeedReport, SeedError> {
    reconcile::reconcile(store, config, catalog, &fast_hasher(), options).await
}
