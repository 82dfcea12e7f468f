//! PharmPilot Seed - bootstrap data reconciler.
//!
//! Brings a store's bootstrap records (accounts, suppliers, categories,
//! report categories, items) to a declared state. Runs are re-runnable:
//! natural-key records are never duplicated and existing accounts are never
//! modified.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pharmpilot_seed::{
//!     HashingParams, PasswordHasher, SeedCatalog, SeedConfig, SeedOptions, config, reconcile,
//!     store::PgSeedStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PgSeedStore::connect(&config::database_url()?).await?;
//! let report = reconcile::run(
//!     &store,
//!     &SeedConfig::from_env()?,
//!     &SeedCatalog::bundled()?,
//!     &PasswordHasher::new(HashingParams::default())?,
//!     SeedOptions::default(),
//! )
//! .await?;
//! println!("{} items created", report.items_created);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Bootstrap accounts and database URL from the environment
//! - [`catalog`] - YAML seed data and its validation
//! - [`password`] - Argon2id hashing
//! - [`store`] - Store trait with `PostgreSQL` and in-memory implementations
//! - [`reconcile`] - The pipeline itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod reconcile;
pub mod store;

pub use catalog::{CatalogReport, DataError, ItemSeed, SeedCatalog, validate_catalog};
pub use config::{BootstrapAccount, ConfigError, SeedConfig};
pub use error::{SeedError, Stage};
pub use password::{HashingParams, PasswordError, PasswordHasher};
pub use reconcile::{SeedOptions, SeedReport};
pub use store::{CategoryLinkMode, MemoryStore, PgSeedStore, SeedStore, StoreError};
