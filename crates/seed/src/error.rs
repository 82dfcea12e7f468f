//! Error type for a seed run.

use std::fmt;

use thiserror::Error;

use crate::catalog::DataError;
use crate::config::ConfigError;
use crate::password::PasswordError;
use crate::store::StoreError;

/// Pipeline stage in which a store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Accounts,
    Suppliers,
    Categories,
    ReportCategories,
    Items,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accounts => "accounts",
            Self::Suppliers => "suppliers",
            Self::Categories => "categories",
            Self::ReportCategories => "report categories",
            Self::Items => "items",
        })
    }
}

/// Errors that abort a seed run.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Seed data could not be loaded or failed validation.
    #[error("seed data error: {0}")]
    Data(#[from] DataError),

    /// A bootstrap password could not be hashed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// The store could not be reached.
    #[error("failed to connect to store: {0}")]
    Connect(#[source] StoreError),

    /// A store call failed. Earlier changes remain applied.
    #[error("store error while seeding {stage} ({key}): {source}")]
    Store {
        stage: Stage,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl SeedError {
    pub(crate) fn store(stage: Stage, key: impl Into<String>) -> impl FnOnce(StoreError) -> Self {
        let key = key.into();
        move |source| Self::Store { stage, key, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_names_stage_and_key() {
        let err = SeedError::store(Stage::ReportCategories, "Daily Sales")(StoreError::NotFound(
            "row".to_owned(),
        ));
        assert_eq!(
            err.to_string(),
            "store error while seeding report categories (Daily Sales): not found: row"
        );
    }
}
