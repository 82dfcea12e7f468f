//! The seed reconciliation pipeline.
//!
//! A run moves the store toward the bootstrap data set in three stages, each
//! store call awaited before the next one is issued:
//!
//! 1. **Accounts** - create missing bootstrap accounts; never touch existing ones
//! 2. **Reference data** - upsert-or-noop suppliers (by email), categories and
//!    report categories (by name)
//! 3. **Items** - resolve supplier/category references against stage 2 and
//!    update the first item with the same name, or create one
//!
//! Nothing is deleted. A store failure aborts the run and leaves whatever was
//! already written in place.

use tracing::{debug, info, instrument};

use crate::catalog::{ItemSeed, SeedCatalog};
use crate::config::{BootstrapAccount, SeedConfig};
use crate::error::{SeedError, Stage};
use crate::models::{Category, ItemData, NewAccount, Supplier};
use crate::password::PasswordHasher;
use crate::store::{CategoryLinkMode, SeedStore};

/// Knobs for a seed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedOptions {
    /// How category links are applied to items that already exist.
    pub link_mode: CategoryLinkMode,
}

/// Counters describing what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub accounts_created: usize,
    pub accounts_existing: usize,
    pub suppliers_created: usize,
    pub suppliers_matched: usize,
    pub categories_created: usize,
    pub categories_matched: usize,
    pub report_categories_created: usize,
    pub report_categories_matched: usize,
    pub items_created: usize,
    pub items_updated: usize,
    /// Items whose declared supplier was not found.
    pub items_without_supplier: usize,
}

/// Run the full pipeline, then disconnect the store whatever the outcome.
///
/// # Errors
///
/// Returns the first `SeedError` raised by any stage.
pub async fn run<S>(
    store: &S,
    config: &SeedConfig,
    catalog: &SeedCatalog,
    hasher: &PasswordHasher,
    options: SeedOptions,
) -> Result<SeedReport, SeedError>
where
    S: SeedStore + ?Sized,
{
    let result = reconcile(store, config, catalog, hasher, options).await;
    store.disconnect().await;
    result
}

/// Run the pipeline without releasing the store.
///
/// # Errors
///
/// Returns the first `SeedError` raised by any stage.
pub async fn reconcile<S>(
    store: &S,
    config: &SeedConfig,
    catalog: &SeedCatalog,
    hasher: &PasswordHasher,
    options: SeedOptions,
) -> Result<SeedReport, SeedError>
where
    S: SeedStore + ?Sized,
{
    info!("Started seeding ...");
    let mut report = SeedReport::default();

    for account in &config.accounts {
        ensure_account(store, account, hasher, &mut report).await?;
    }

    let suppliers = reconcile_suppliers(store, catalog, &mut report).await?;
    let categories = reconcile_categories(store, catalog, &mut report).await?;
    reconcile_report_categories(store, catalog, &mut report).await?;
    reconcile_items(
        store,
        &catalog.items,
        &suppliers,
        &categories,
        options.link_mode,
        &mut report,
    )
    .await?;

    info!("Seeding finished.");
    Ok(report)
}

/// Create a bootstrap account unless its email is already taken.
#[instrument(skip_all, fields(role = %account.role, email = %account.email))]
async fn ensure_account<S>(
    store: &S,
    account: &BootstrapAccount,
    hasher: &PasswordHasher,
    report: &mut SeedReport,
) -> Result<(), SeedError>
where
    S: SeedStore + ?Sized,
{
    let label = account.role.label();
    let key = account.email.as_str();

    let existing = store
        .find_account_by_email(&account.email)
        .await
        .map_err(SeedError::store(Stage::Accounts, key))?;

    if existing.is_some() {
        info!("{label} with email {key} already exists.");
        report.accounts_existing += 1;
        return Ok(());
    }

    let password_hash = hasher.hash(&account.password).await?;
    let new_account = NewAccount::new(
        account.email.clone(),
        &account.name,
        password_hash,
        account.role,
    );
    let created = store
        .create_account(&new_account)
        .await
        .map_err(SeedError::store(Stage::Accounts, key))?;

    info!("{label} \"{}\" created with email {}", created.name, created.email);
    report.accounts_created += 1;
    Ok(())
}

async fn reconcile_suppliers<S>(
    store: &S,
    catalog: &SeedCatalog,
    report: &mut SeedReport,
) -> Result<Vec<Supplier>, SeedError>
where
    S: SeedStore + ?Sized,
{
    info!("Seeding suppliers...");
    let mut suppliers = Vec::with_capacity(catalog.suppliers.len());
    for supplier in &catalog.suppliers {
        let upserted = store
            .upsert_supplier(supplier)
            .await
            .map_err(SeedError::store(Stage::Suppliers, supplier.email.as_str()))?;
        if upserted.created {
            report.suppliers_created += 1;
        } else {
            report.suppliers_matched += 1;
        }
        suppliers.push(upserted.record);
    }
    Ok(suppliers)
}

async fn reconcile_categories<S>(
    store: &S,
    catalog: &SeedCatalog,
    report: &mut SeedReport,
) -> Result<Vec<Category>, SeedError>
where
    S: SeedStore + ?Sized,
{
    info!("Seeding categories...");
    let mut categories = Vec::with_capacity(catalog.categories.len());
    for category in &catalog.categories {
        let upserted = store
            .upsert_category(category)
            .await
            .map_err(SeedError::store(Stage::Categories, category.name.as_str()))?;
        if upserted.created {
            report.categories_created += 1;
        } else {
            report.categories_matched += 1;
        }
        categories.push(upserted.record);
    }
    Ok(categories)
}

async fn reconcile_report_categories<S>(
    store: &S,
    catalog: &SeedCatalog,
    report: &mut SeedReport,
) -> Result<(), SeedError>
where
    S: SeedStore + ?Sized,
{
    info!("Seeding report categories...");
    for category in &catalog.report_categories {
        let upserted = store
            .upsert_report_category(category)
            .await
            .map_err(SeedError::store(Stage::ReportCategories, category.name.as_str()))?;
        if upserted.created {
            report.report_categories_created += 1;
        } else {
            report.report_categories_matched += 1;
        }
    }
    Ok(())
}

async fn reconcile_items<S>(
    store: &S,
    items: &[ItemSeed],
    suppliers: &[Supplier],
    categories: &[Category],
    link_mode: CategoryLinkMode,
    report: &mut SeedReport,
) -> Result<(), SeedError>
where
    S: SeedStore + ?Sized,
{
    info!("Seeding items...");
    for seed in items {
        let data = resolve_item(seed, suppliers, categories);
        if seed.supplier_name.is_some() && data.supplier_id.is_none() {
            report.items_without_supplier += 1;
        }

        let existing = store
            .find_first_item_id_by_name(&seed.name)
            .await
            .map_err(SeedError::store(Stage::Items, seed.name.as_str()))?;

        match existing {
            Some(id) => {
                store
                    .update_item(id, &data, link_mode)
                    .await
                    .map_err(SeedError::store(Stage::Items, seed.name.as_str()))?;
                debug!(item = %seed.name, %id, "Updated item");
                report.items_updated += 1;
            }
            None => {
                let id = store
                    .create_item(&data)
                    .await
                    .map_err(SeedError::store(Stage::Items, seed.name.as_str()))?;
                debug!(item = %seed.name, %id, "Created item");
                report.items_created += 1;
            }
        }
    }
    Ok(())
}

/// Compute the persisted field set for an item descriptor.
///
/// The supplier is the first seeded supplier with exactly the declared
/// name; categories are every seeded category named in the descriptor, in
/// seeded order. Unresolved references are dropped, not reported as errors.
#[must_use]
pub fn resolve_item(seed: &ItemSeed, suppliers: &[Supplier], categories: &[Category]) -> ItemData {
    let supplier_id = seed.supplier_name.as_deref().and_then(|wanted| {
        let found = suppliers.iter().find(|s| s.name == wanted).map(|s| s.id);
        if found.is_none() {
            debug!(item = %seed.name, supplier = %wanted, "Supplier not found, leaving item unlinked");
        }
        found
    });

    let category_ids = categories
        .iter()
        .filter(|c| seed.category_names.contains(&c.name))
        .map(|c| c.id)
        .collect();

    ItemData {
        name: seed.name.clone(),
        manufacturer: seed.manufacturer.clone(),
        generic_name: seed.generic_name.clone(),
        formulation: seed.formulation.clone(),
        strength: seed.strength.clone(),
        unit: seed.unit.clone(),
        schedule: seed.schedule.clone(),
        description: seed.description.clone(),
        units_per_pack: seed.units_per_pack,
        price: seed.price,
        tax_rate: seed.tax_rate,
        discount: seed.discount,
        reorder_level: seed.reorder_level,
        quantity_in_stock: seed.quantity_in_stock,
        expiry_date: seed.expiry_date,
        purchase_price: seed.effective_purchase_price(),
        purchase_date: seed.purchase_date,
        is_active: seed.is_active,
        is_available: seed.is_available,
        supplier_id,
        category_ids,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use pharmpilot_core::{CategoryId, Email, SupplierId};

    use super::*;

    fn supplier(name: &str, email: &str) -> Supplier {
        Supplier {
            id: SupplierId::generate(),
            name: name.to_owned(),
            email: Email::parse(email).unwrap(),
            phone: None,
            address: None,
            contact_person: None,
        }
    }

    fn category(name: &str) -> Category {
        Category {
            id: CategoryId::generate(),
            name: name.to_owned(),
            description: None,
        }
    }

    fn seed(yaml: &str) -> ItemSeed {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_resolve_links_supplier_and_categories() {
        let suppliers = [supplier("Acme", "a@x.com")];
        let categories = [category("Painkiller"), category("Antibiotic")];
        let item = seed(
            "{ name: Panadol, supplier_name: Acme, category_names: [Painkiller], price: 10 }",
        );

        let data = resolve_item(&item, &suppliers, &categories);

        assert_eq!(data.supplier_id, Some(suppliers[0].id));
        assert_eq!(data.category_ids, vec![categories[0].id]);
        assert_eq!(data.purchase_price, Decimal::from(10));
    }

    #[test]
    fn test_resolve_first_supplier_match_wins() {
        let suppliers = [supplier("Acme", "a@x.com"), supplier("Acme", "b@x.com")];
        let item = seed("{ name: Panadol, supplier_name: Acme, price: 1 }");

        let data = resolve_item(&item, &suppliers, &[]);

        assert_eq!(data.supplier_id, Some(suppliers[0].id));
    }

    #[test]
    fn test_resolve_unknown_references_are_dropped() {
        let suppliers = [supplier("Acme", "a@x.com")];
        let categories = [category("Painkiller")];
        let item = seed(
            "{ name: Orphan, supplier_name: Nobody, category_names: [Ghost, Painkiller], price: 2 }",
        );

        let data = resolve_item(&item, &suppliers, &categories);

        assert_eq!(data.supplier_id, None);
        assert_eq!(data.category_ids, vec![categories[0].id]);
    }

    #[test]
    fn test_resolve_categories_follow_seeded_order() {
        let categories = [category("A"), category("B"), category("C")];
        let item = seed("{ name: Mix, category_names: [C, A], price: 1 }");

        let data = resolve_item(&item, &[], &categories);

        assert_eq!(data.category_ids, vec![categories[0].id, categories[2].id]);
    }

    #[test]
    fn test_resolve_keeps_explicit_purchase_price() {
        let item = seed("{ name: Amoxil, price: 12.8, purchase_price: 9.4 }");
        let data = resolve_item(&item, &[], &[]);
        assert_eq!(data.price, Decimal::new(128, 1));
        assert_eq!(data.purchase_price, Decimal::new(94, 1));
    }
}
