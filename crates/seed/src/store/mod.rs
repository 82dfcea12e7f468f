//! Data-access seam for the reconciler.
//!
//! [`SeedStore`] is the narrow set of operations a seed run issues. Two
//! implementations ship with the crate:
//!
//! - [`PgSeedStore`] - `PostgreSQL` via sqlx, used by `pp-cli seed`
//! - [`MemoryStore`] - in-process tables, used by dry runs and tests
//!
//! Natural-key uniqueness is the store's job: `PostgreSQL` enforces it with
//! `UNIQUE` constraints and `ON CONFLICT`, the memory store with index maps.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use pharmpilot_core::{Email, ItemId};

use crate::models::{
    Account, Category, ItemData, NewAccount, NewCategory, NewReportCategory, NewSupplier,
    ReportCategory, Supplier, Upserted,
};

pub use memory::MemoryStore;
pub use postgres::PgSeedStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A schema migration failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Map a sqlx error, turning unique violations into `Conflict`.
    pub(crate) fn from_sqlx(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// How item-category links are applied when an existing item is updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryLinkMode {
    /// Add missing links and keep any others already present.
    #[default]
    Append,
    /// Make the item's links exactly the resolved set.
    Replace,
}

/// Operations a seed run needs from persistent storage.
///
/// Every method is its own atomic unit; the reconciler never spans a
/// transaction across calls.
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Find an account by its email.
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    /// Create an account. Customer accounts get their profile in the same unit.
    async fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError>;

    /// Insert a supplier by email, or return the existing row unchanged.
    async fn upsert_supplier(
        &self,
        supplier: &NewSupplier,
    ) -> Result<Upserted<Supplier>, StoreError>;

    /// Insert a category by name, or return the existing row unchanged.
    async fn upsert_category(
        &self,
        category: &NewCategory,
    ) -> Result<Upserted<Category>, StoreError>;

    /// Insert a report category by name, or return the existing row unchanged.
    async fn upsert_report_category(
        &self,
        category: &NewReportCategory,
    ) -> Result<Upserted<ReportCategory>, StoreError>;

    /// Id of the oldest item with exactly this name, if any.
    async fn find_first_item_id_by_name(&self, name: &str) -> Result<Option<ItemId>, StoreError>;

    /// Create an item with its category links.
    async fn create_item(&self, item: &ItemData) -> Result<ItemId, StoreError>;

    /// Overwrite every field of an item and apply its category links.
    async fn update_item(
        &self,
        id: ItemId,
        item: &ItemData,
        links: CategoryLinkMode,
    ) -> Result<(), StoreError>;

    /// Release the underlying connection(s). Called once, after the run.
    async fn disconnect(&self);
}
