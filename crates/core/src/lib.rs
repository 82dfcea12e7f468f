//! PharmPilot Core - Shared types library.
//!
//! This crate provides the domain types shared by the PharmPilot tools:
//! - `seed` - Bootstrap data reconciler (accounts, suppliers, categories, items)
//! - `cli` - Command-line entry point for seeding and migrations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. Enable the
//! `postgres` feature to get `sqlx` encode/decode implementations.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and account roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
