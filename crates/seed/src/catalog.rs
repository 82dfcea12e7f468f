//! Seed data catalog loaded from YAML.
//!
//! The catalog holds the four input collections of a seed run. A default
//! catalog is compiled into the binary; `--data` points at a replacement.
//!
//! ## YAML Format
//!
//! ```yaml
//! suppliers:
//!   - name: Acme
//!     email: a@x.com
//! categories:
//!   - name: Painkiller
//! report_categories:
//!   - name: Daily Sales
//! items:
//!   - name: Panadol
//!     supplier_name: Acme
//!     category_names: [Painkiller]
//!     price: 10
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{NewCategory, NewReportCategory, NewSupplier};

/// Catalog bundled with the binary.
const BUNDLED_CATALOG: &str = include_str!("../data/catalog.yaml");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum DataError {
    /// The catalog file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid YAML or does not match the expected shape.
    #[error("failed to parse seed data: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Validation found blocking problems.
    #[error("{} seed data problem(s): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),
}

/// Item as declared in seed data.
///
/// References its supplier by name and its categories by name; both are
/// resolved against the reconciled reference data at seeding time.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ItemSeed {
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub formulation: Option<String>,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_units_per_pack")]
    pub units_per_pack: i32,
    pub price: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub reorder_level: i32,
    #[serde(default)]
    pub quantity_in_stock: i32,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_price: Option<Decimal>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub category_names: Vec<String>,
}

const fn default_units_per_pack() -> i32 {
    1
}

const fn default_true() -> bool {
    true
}

impl ItemSeed {
    /// Purchase price to persist: the declared one, else the sale price.
    #[must_use]
    pub fn effective_purchase_price(&self) -> Decimal {
        self.purchase_price.unwrap_or(self.price)
    }
}

/// The full set of bootstrap data for one seed run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub suppliers: Vec<NewSupplier>,
    #[serde(default)]
    pub categories: Vec<NewCategory>,
    #[serde(default)]
    pub report_categories: Vec<NewReportCategory>,
    #[serde(default)]
    pub items: Vec<ItemSeed>,
}

impl SeedCatalog {
    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Parse` if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, DataError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Parse` if the bundled file is malformed.
    pub fn bundled() -> Result<Self, DataError> {
        Self::from_yaml(BUNDLED_CATALOG)
    }

    /// Read a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Io` if the file cannot be read, `DataError::Parse`
    /// if its content is malformed.
    pub async fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DataError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given, otherwise the bundled catalog.
    ///
    /// # Errors
    ///
    /// See [`SeedCatalog::from_file`] and [`SeedCatalog::bundled`].
    pub async fn load(path: Option<&Path>) -> Result<Self, DataError> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => Self::bundled(),
        }
    }
}

/// Problems found by [`validate_catalog`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    /// Problems that make the catalog unusable.
    pub errors: Vec<String>,
    /// Tolerated oddities (e.g. an item naming an unknown supplier).
    pub warnings: Vec<String>,
}

impl CatalogReport {
    /// True when no errors were found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert into a `Result`, keeping warnings on success.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Invalid` carrying the error list.
    pub fn into_result(self) -> Result<Vec<String>, DataError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(DataError::Invalid(self.errors))
        }
    }
}

/// Validate a catalog before seeding.
///
/// Duplicate natural keys are errors because the store would silently fold
/// them into one row. Dangling supplier/category references are warnings:
/// the reconciler tolerates them and leaves the item unlinked.
#[must_use]
pub fn validate_catalog(catalog: &SeedCatalog) -> CatalogReport {
    let mut report = CatalogReport::default();

    let mut supplier_emails = HashSet::new();
    for (i, supplier) in catalog.suppliers.iter().enumerate() {
        if supplier.name.trim().is_empty() {
            report.errors.push(format!("supplier at index {i} has an empty name"));
        }
        if !supplier_emails.insert(supplier.email.as_str()) {
            report
                .errors
                .push(format!("duplicate supplier email: {}", supplier.email));
        }
    }

    check_unique_names(
        "category",
        catalog.categories.iter().map(|c| c.name.as_str()),
        &mut report,
    );
    check_unique_names(
        "report category",
        catalog.report_categories.iter().map(|c| c.name.as_str()),
        &mut report,
    );

    let supplier_names: HashSet<&str> = catalog.suppliers.iter().map(|s| s.name.as_str()).collect();
    let category_names: HashSet<&str> =
        catalog.categories.iter().map(|c| c.name.as_str()).collect();

    for (i, item) in catalog.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            report.errors.push(format!("item at index {i} has an empty name"));
            continue;
        }
        for (field, value) in [
            ("price", item.price),
            ("tax_rate", item.tax_rate),
            ("discount", item.discount),
            ("purchase_price", item.effective_purchase_price()),
        ] {
            if value.is_sign_negative() {
                report
                    .errors
                    .push(format!("item '{}' has a negative {field}", item.name));
            }
        }
        for (field, value) in [
            ("units_per_pack", item.units_per_pack),
            ("reorder_level", item.reorder_level),
            ("quantity_in_stock", item.quantity_in_stock),
        ] {
            if value < 0 {
                report
                    .errors
                    .push(format!("item '{}' has a negative {field}", item.name));
            }
        }
        if let Some(supplier) = &item.supplier_name
            && !supplier_names.contains(supplier.as_str())
        {
            report.warnings.push(format!(
                "item '{}' references unknown supplier '{supplier}'",
                item.name
            ));
        }
        for category in &item.category_names {
            if !category_names.contains(category.as_str()) {
                report.warnings.push(format!(
                    "item '{}' references unknown category '{category}'",
                    item.name
                ));
            }
        }
    }

    report
}

fn check_unique_names<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
    report: &mut CatalogReport,
) {
    let mut seen = HashSet::new();
    for (i, name) in names.enumerate() {
        if name.trim().is_empty() {
            report.errors.push(format!("{kind} at index {i} has an empty name"));
        } else if !seen.insert(name) {
            report.errors.push(format!("duplicate {kind} name: {name}"));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
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

    #[test]
    fn test_parse_sample() {
        let catalog = SeedCatalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(catalog.suppliers.len(), 1);
        assert_eq!(catalog.suppliers[0].email.as_str(), "a@x.com");
        assert_eq!(catalog.report_categories[0].name, "Daily Sales");

        let item = &catalog.items[0];
        assert_eq!(item.price, Decimal::from(10));
        assert_eq!(item.purchase_price, None);
        assert_eq!(item.units_per_pack, 1);
        assert!(item.is_active && item.is_available);
        assert_eq!(item.category_names, vec!["Painkiller".to_owned()]);
    }

    #[test]
    fn test_effective_purchase_price_falls_back_to_price() {
        let mut item = SeedCatalog::from_yaml(SAMPLE).unwrap().items.remove(0);
        assert_eq!(item.effective_purchase_price(), Decimal::from(10));

        item.purchase_price = Some(Decimal::new(75, 1));
        assert_eq!(item.effective_purchase_price(), Decimal::new(75, 1));
    }

    #[test]
    fn test_parse_dates_and_decimals() {
        let yaml = r#"
items:
  - name: Amoxil
    price: "12.50"
    tax_rate: 0.05
    expiry_date: 2027-06-30
    purchase_date: "2025-01-15"
"#;
        let item = SeedCatalog::from_yaml(yaml).unwrap().items.remove(0);
        assert_eq!(item.price, Decimal::new(1250, 2));
        assert_eq!(item.tax_rate, Decimal::new(5, 2));
        assert_eq!(item.expiry_date, NaiveDate::from_ymd_opt(2027, 6, 30));
        assert_eq!(item.purchase_date, NaiveDate::from_ymd_opt(2025, 1, 15));
    }

    #[test]
    fn test_invalid_supplier_email_fails_to_parse() {
        let yaml = "suppliers:\n  - name: Bad\n    email: nope\n";
        assert!(matches!(
            SeedCatalog::from_yaml(yaml),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = SeedCatalog::bundled().unwrap();
        assert!(!catalog.suppliers.is_empty());
        assert!(!catalog.categories.is_empty());
        assert!(!catalog.report_categories.is_empty());
        assert!(!catalog.items.is_empty());

        let report = validate_catalog(&catalog);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
    }

    #[test]
    fn test_validate_flags_duplicates() {
        let yaml = r"
suppliers:
  - { name: A, email: a@x.com }
  - { name: B, email: a@x.com }
categories:
  - name: Painkiller
  - name: Painkiller
";
        let report = validate_catalog(&SeedCatalog::from_yaml(yaml).unwrap());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("duplicate supplier email"));
        assert!(report.errors[1].contains("duplicate category name"));
    }

    #[test]
    fn test_validate_warns_on_dangling_references() {
        let yaml = r"
items:
  - name: Orphan
    price: 1
    supplier_name: Nobody
    category_names: [Ghost]
";
        let report = validate_catalog(&SeedCatalog::from_yaml(yaml).unwrap());
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        let yaml = r"
items:
  - name: Broken
    price: -1
    quantity_in_stock: -5
";
        let report = validate_catalog(&SeedCatalog::from_yaml(yaml).unwrap());
        // price, fallback purchase_price, quantity_in_stock
        assert_eq!(report.errors.len(), 3);
        assert!(matches!(
            report.into_result(),
            Err(DataError::Invalid(errors)) if errors.len() == 3
        ));
    }
}
