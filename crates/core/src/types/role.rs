//! Account roles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}. Valid roles: super_admin, admin, customer")]
pub struct RoleParseError(pub String);

/// Role of a PharmPilot account.
///
/// Stored in the `app.user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "app.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access including account management.
    SuperAdmin,
    /// Store and inventory management.
    Admin,
    /// Storefront customer; always paired with a customer profile.
    Customer,
}

impl Role {
    /// All roles, in bootstrap order.
    pub const ALL: [Self; 3] = [Self::SuperAdmin, Self::Admin, Self::Customer];

    /// Returns the `snake_case` identifier used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }

    /// Human-readable label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::Admin => "Admin user",
            Self::Customer => "Customer user",
        }
    }

    /// Whether accounts with this role carry a customer profile.
    #[must_use]
    pub const fn has_customer_profile(self) -> bool {
        matches!(self, Self::Customer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
