//! Records written and read by the reconciler.
//!
//! `New*` types are what the reconciler asks a store to create; the plain
//! types are what a store hands back once a row exists.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use pharmpilot_core::{
    CategoryId, CustomerId, Email, ItemId, ReportCategoryId, Role, SupplierId, UserId,
};

/// Placeholder postal address given to seeded customer profiles.
pub const PLACEHOLDER_ADDRESS: &str = "123 Main St";

// =============================================================================
// Accounts
// =============================================================================

/// A persisted account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: Option<DateTime<Utc>>,
}

/// Account to be created. Seeded accounts are always active.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: DateTime<Utc>,
}

impl NewAccount {
    /// Build an account from a display name, deriving first/last name.
    #[must_use]
    pub fn new(email: Email, name: &str, password_hash: String, role: Role) -> Self {
        let (first_name, last_name) = split_display_name(name);
        Self {
            email,
            name: name.to_owned(),
            first_name,
            last_name,
            password_hash,
            role,
            email_verified: Utc::now(),
        }
    }

    /// The customer profile that accompanies this account, if its role has one.
    #[must_use]
    pub fn customer_profile(&self) -> Option<NewCustomerProfile> {
        self.role
            .has_customer_profile()
            .then(|| NewCustomerProfile {
                name: self.name.clone(),
                email: self.email.clone(),
                address: PLACEHOLDER_ADDRESS.to_owned(),
            })
    }
}

/// Customer profile created alongside a customer account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomerProfile {
    pub name: String,
    pub email: Email,
    pub address: String,
}

/// A persisted customer profile.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub address: String,
}

/// Split a display name on single spaces: first token, then the rest.
///
/// `"Super Administrator"` becomes `("Super", "Administrator")`,
/// `"Admin"` becomes `("Admin", "")`.
#[must_use]
pub fn split_display_name(name: &str) -> (String, String) {
    let mut parts = name.split(' ');
    let first = parts.next().unwrap_or_default().to_owned();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

// =============================================================================
// Reference data
// =============================================================================

/// Supplier as declared in seed data. Keyed by email.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewSupplier {
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
}

/// A persisted supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
}

/// Category as declared in seed data. Keyed by name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Report category as declared in seed data. Keyed by name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewReportCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A persisted report category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCategory {
    pub id: ReportCategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Outcome of an upsert-or-noop: the row, and whether this call inserted it.
#[derive(Debug, Clone)]
pub struct Upserted<T> {
    pub record: T,
    pub created: bool,
}

// =============================================================================
// Items
// =============================================================================

/// Full field set persisted for an item, on create and on update alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemData {
    pub name: String,
    pub manufacturer: Option<String>,
    pub generic_name: Option<String>,
    pub formulation: Option<String>,
    pub strength: Option<String>,
    pub unit: Option<String>,
    pub schedule: Option<String>,
    pub description: Option<String>,
    pub units_per_pack: i32,
    pub price: Decimal,
    pub tax_rate: Decimal,
    pub discount: Decimal,
    pub reorder_level: i32,
    pub quantity_in_stock: i32,
    pub expiry_date: Option<NaiveDate>,
    pub purchase_price: Decimal,
    pub purchase_date: Option<NaiveDate>,
    pub is_active: bool,
    pub is_available: bool,
    pub supplier_id: Option<SupplierId>,
    pub category_ids: Vec<CategoryId>,
}

/// A persisted item, as returned by stores that can read items back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub data: ItemData,
}
