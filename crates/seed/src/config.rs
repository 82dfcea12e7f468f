//! Seed configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Bootstrap accounts (optional, defaults with a warning)
//! - `APP_SUPER_ADMIN_EMAIL` / `APP_SUPER_ADMIN_PASSWORD` / `APP_SUPER_ADMIN_NAME`
//! - `APP_ADMIN_EMAIL` / `APP_ADMIN_PASSWORD` / `APP_ADMIN_NAME`
//! - `APP_CUSTOMER_EMAIL` / `APP_CUSTOMER_PASSWORD` / `APP_CUSTOMER_NAME`
//!
//! ## Database (required unless running a dry run)
//! - `PHARMPILOT_DATABASE_URL` - `PostgreSQL` connection string
//! - `DATABASE_URL` - Fallback when the above is unset

use secrecy::SecretString;
use thiserror::Error;
use tracing::warn;

use pharmpilot_core::{Email, EmailError, Role};

/// Primary database URL variable.
pub const DATABASE_URL_VAR: &str = "PHARMPILOT_DATABASE_URL";

/// Generic fallback database URL variable.
const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid email in {key}: {source}")]
    InvalidEmail {
        key: String,
        #[source]
        source: EmailError,
    },
}

/// Environment keys and fallbacks for one bootstrap role.
#[derive(Debug, Clone, Copy)]
struct AccountDefaults {
    prefix: &'static str,
    email: &'static str,
    password: &'static str,
    name: &'static str,
}

const fn defaults_for(role: Role) -> AccountDefaults {
    match role {
        Role::SuperAdmin => AccountDefaults {
            prefix: "APP_SUPER_ADMIN",
            email: "superadmin@example.com",
            password: "superStrongPass123!",
            name: "Super Administrator",
        },
        Role::Admin => AccountDefaults {
            prefix: "APP_ADMIN",
            email: "admin@pharmpilot.local",
            password: "admin1234",
            name: "Admin User",
        },
        Role::Customer => AccountDefaults {
            prefix: "APP_CUSTOMER",
            email: "customer@pharmpilot.local",
            password: "customer1234",
            name: "Customer User",
        },
    }
}

/// Identity of one bootstrap account.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct BootstrapAccount {
    pub role: Role,
    pub email: Email,
    pub password: SecretString,
    pub name: String,
    /// True when at least one value came from the built-in defaults.
    pub defaulted: bool,
}

impl std::fmt::Debug for BootstrapAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAccount")
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("defaulted", &self.defaulted)
            .finish()
    }
}

impl BootstrapAccount {
    /// Resolve the account for `role` through `lookup`.
    ///
    /// Each missing key falls back to its default. A warning is logged once
    /// per role when any of its three keys is missing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEmail` if the resolved email is malformed.
    pub fn resolve<F>(role: Role, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = defaults_for(role);
        let email_key = format!("{}_EMAIL", defaults.prefix);
        let password_key = format!("{}_PASSWORD", defaults.prefix);
        let name_key = format!("{}_NAME", defaults.prefix);

        let email = lookup(&email_key);
        let password = lookup(&password_key);
        let name = lookup(&name_key);

        let defaulted = email.is_none() || password.is_none() || name.is_none();
        if defaulted {
            warn!(
                role = %role,
                "Kindly add {email_key}, {password_key}, and {name_key} for seeding. \
                 Using default credentials for seeding. PLEASE CHANGE THESE FOR PRODUCTION."
            );
        }

        let email = email.as_deref().unwrap_or(defaults.email);
        let email = Email::parse(email).map_err(|source| ConfigError::InvalidEmail {
            key: email_key,
            source,
        })?;

        Ok(Self {
            role,
            email,
            password: SecretString::from(password.unwrap_or_else(|| defaults.password.to_owned())),
            name: name.unwrap_or_else(|| defaults.name.to_owned()),
            defaulted,
        })
    }
}

/// Everything a seed run needs from the environment.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Bootstrap accounts in creation order: super-admin, admin, customer.
    pub accounts: Vec<BootstrapAccount>,
}

impl SeedConfig {
    /// Load from the process environment, reading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a configured value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(get_optional_env)
    }

    /// Load through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a resolved value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let accounts = Role::ALL
            .into_iter()
            .map(|role| BootstrapAccount::resolve(role, &lookup))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { accounts })
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_optional_env(DATABASE_URL_VAR)
        .or_else(|| get_optional_env(FALLBACK_DATABASE_URL_VAR))
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_owned()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = SeedConfig::from_lookup(|_| None).unwrap();
        let emails: Vec<_> = config.accounts.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(
            emails,
            [
                "superadmin@example.com",
                "admin@pharmpilot.local",
                "customer@pharmpilot.local"
            ]
        );
        assert!(config.accounts.iter().all(|a| a.defaulted));
        assert_eq!(config.accounts[0].name, "Super Administrator");
        assert_eq!(config.accounts[2].password.expose_secret(), "customer1234");
    }

    #[test]
    fn test_roles_in_bootstrap_order() {
        let config = SeedConfig::from_lookup(|_| None).unwrap();
        let roles: Vec<_> = config.accounts.iter().map(|a| a.role).collect();
        assert_eq!(roles, Role::ALL);
    }

    #[test]
    fn test_configured_values_win() {
        let lookup = lookup_from(&[
            ("APP_ADMIN_EMAIL", "ops@pharmacy.test"),
            ("APP_ADMIN_PASSWORD", "s3cret-value"),
            ("APP_ADMIN_NAME", "Ops Lead"),
        ]);
        let admin = BootstrapAccount::resolve(Role::Admin, lookup).unwrap();
        assert_eq!(admin.email.as_str(), "ops@pharmacy.test");
        assert_eq!(admin.password.expose_secret(), "s3cret-value");
        assert_eq!(admin.name, "Ops Lead");
        assert!(!admin.defaulted);
    }

    #[test]
    fn test_partial_config_defaults_missing_keys() {
        let lookup = lookup_from(&[("APP_CUSTOMER_EMAIL", "walkin@pharmacy.test")]);
        let customer = BootstrapAccount::resolve(Role::Customer, lookup).unwrap();
        assert_eq!(customer.email.as_str(), "walkin@pharmacy.test");
        assert_eq!(customer.name, "Customer User");
        assert!(customer.defaulted);
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let lookup = lookup_from(&[("APP_SUPER_ADMIN_EMAIL", "root")]);
        let err = BootstrapAccount::resolve(Role::SuperAdmin, lookup).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEmail { ref key, .. } if key == "APP_SUPER_ADMIN_EMAIL"
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let account = BootstrapAccount::resolve(Role::Admin, |_| None).unwrap();
        let debug = format!("{account:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("admin1234"));
    }
}
