//! In-process [`SeedStore`] used for dry runs and tests.
//!
//! Tables are plain vectors guarded by a mutex; natural-key uniqueness is
//! checked on insert the way the `PostgreSQL` constraints would. Rows keep
//! insertion order, so "first item by name" means "oldest".

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use pharmpilot_core::{CategoryId, CustomerId, Email, ItemId, ReportCategoryId, SupplierId, UserId};

use super::{CategoryLinkMode, SeedStore, StoreError};
use crate::models::{
    Account, Category, CustomerProfile, Item, ItemData, NewAccount, NewCategory,
    NewReportCategory, NewSupplier, ReportCategory, Supplier, Upserted,
};

/// Store operations that can be made to fail in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FindAccount,
    CreateAccount,
    UpsertSupplier,
    UpsertCategory,
    UpsertReportCategory,
    FindItem,
    CreateItem,
    UpdateItem,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    customers: Vec<CustomerProfile>,
    suppliers: Vec<Supplier>,
    categories: Vec<Category>,
    report_categories: Vec<ReportCategory>,
    items: Vec<Item>,
    fail_on: Option<Operation>,
    disconnected: bool,
    writes: usize,
}

impl Tables {
    fn check(&self, op: Operation) -> Result<(), StoreError> {
        if self.disconnected {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        if self.fail_on == Some(op) {
            return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                "injected failure on {op:?}"
            ))));
        }
        Ok(())
    }
}

/// Seed store holding everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call of `op` fail with a database error.
    pub fn fail_on(&self, op: Operation) {
        self.lock().fail_on = Some(op);
    }

    /// Snapshot of all accounts.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.lock().accounts.clone()
    }

    /// Snapshot of all customer profiles.
    #[must_use]
    pub fn customers(&self) -> Vec<CustomerProfile> {
        self.lock().customers.clone()
    }

    /// Snapshot of all suppliers.
    #[must_use]
    pub fn suppliers(&self) -> Vec<Supplier> {
        self.lock().suppliers.clone()
    }

    /// Snapshot of all categories.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    /// Snapshot of all report categories.
    #[must_use]
    pub fn report_categories(&self) -> Vec<ReportCategory> {
        self.lock().report_categories.clone()
    }

    /// Snapshot of all items.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    /// Number of successful create/update calls (matched upserts excluded).
    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Whether [`SeedStore::disconnect`] has been called.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.lock().disconnected
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let tables = self.lock();
        tables.check(Operation::FindAccount)?;
        Ok(tables.accounts.iter().find(|a| &a.email == email).cloned())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.lock();
        tables.check(Operation::CreateAccount)?;
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict("account already exists".to_owned()));
        }

        let created = Account {
            id: UserId::generate(),
            email: account.email.clone(),
            name: account.name.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            is_active: true,
            email_verified: Some(account.email_verified),
        };
        if let Some(profile) = account.customer_profile() {
            tables.customers.push(CustomerProfile {
                id: CustomerId::generate(),
                user_id: created.id,
                name: profile.name,
                email: profile.email,
                address: profile.address,
            });
        }
        tables.accounts.push(created.clone());
        tables.writes += 1;
        Ok(created)
    }

    async fn upsert_supplier(
        &self,
        supplier: &NewSupplier,
    ) -> Result<Upserted<Supplier>, StoreError> {
        let mut tables = self.lock();
        tables.check(Operation::UpsertSupplier)?;
        if let Some(existing) = tables.suppliers.iter().find(|s| s.email == supplier.email) {
            return Ok(Upserted {
                record: existing.clone(),
                created: false,
            });
        }

        let record = Supplier {
            id: SupplierId::generate(),
            name: supplier.name.clone(),
            email: supplier.email.clone(),
            phone: supplier.phone.clone(),
            address: supplier.address.clone(),
            contact_person: supplier.contact_person.clone(),
        };
        tables.suppliers.push(record.clone());
        tables.writes += 1;
        Ok(Upserted {
            record,
            created: true,
        })
    }

    async fn upsert_category(
        &self,
        category: &NewCategory,
    ) -> Result<Upserted<Category>, StoreError> {
        let mut tables = self.lock();
        tables.check(Operation::UpsertCategory)?;
        if let Some(existing) = tables.categories.iter().find(|c| c.name == category.name) {
            return Ok(Upserted {
                record: existing.clone(),
                created: false,
            });
        }

        let record = Category {
            id: CategoryId::generate(),
            name: category.name.clone(),
            description: category.description.clone(),
        };
        tables.categories.push(record.clone());
        tables.writes += 1;
        Ok(Upserted {
            record,
            created: true,
        })
    }

    async fn upsert_report_category(
        &self,
        category: &NewReportCategory,
    ) -> Result<Upserted<ReportCategory>, StoreError> {
        let mut tables = self.lock();
        tables.check(Operation::UpsertReportCategory)?;
        if let Some(existing) = tables
            .report_categories
            .iter()
            .find(|c| c.name == category.name)
        {
            return Ok(Upserted {
                record: existing.clone(),
                created: false,
            });
        }

        let record = ReportCategory {
            id: ReportCategoryId::generate(),
            name: category.name.clone(),
            description: category.description.clone(),
        };
        tables.report_categories.push(record.clone());
        tables.writes += 1;
        Ok(Upserted {
            record,
            created: true,
        })
    }

    async fn find_first_item_id_by_name(&self, name: &str) -> Result<Option<ItemId>, StoreError> {
        let tables = self.lock();
        tables.check(Operation::FindItem)?;
        Ok(tables
            .items
            .iter()
            .find(|item| item.data.name == name)
            .map(|item| item.id))
    }

    async fn create_item(&self, item: &ItemData) -> Result<ItemId, StoreError> {
        let mut tables = self.lock();
        tables.check(Operation::CreateItem)?;
        check_references(&tables, item)?;

        let mut data = item.clone();
        dedup_in_order(&mut data.category_ids);
        let id = ItemId::generate();
        tables.items.push(Item { id, data });
        tables.writes += 1;
        Ok(id)
    }

    async fn update_item(
        &self,
        id: ItemId,
        item: &ItemData,
        links: CategoryLinkMode,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.check(Operation::UpdateItem)?;
        check_references(&tables, item)?;

        let existing = tables
            .items
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("item {id}")))?;

        let mut category_ids = match links {
            CategoryLinkMode::Append => {
                let mut merged = existing.data.category_ids.clone();
                merged.extend(item.category_ids.iter().copied());
                merged
            }
            CategoryLinkMode::Replace => item.category_ids.clone(),
        };
        dedup_in_order(&mut category_ids);

        existing.data = ItemData {
            category_ids,
            ..item.clone()
        };
        tables.writes += 1;
        Ok(())
    }

    async fn disconnect(&self) {
        self.lock().disconnected = true;
    }
}

/// Foreign-key checks the `PostgreSQL` schema would enforce.
fn check_references(tables: &Tables, item: &ItemData) -> Result<(), StoreError> {
    if let Some(supplier_id) = item.supplier_id
        && !tables.suppliers.iter().any(|s| s.id == supplier_id)
    {
        return Err(StoreError::NotFound(format!("supplier {supplier_id}")));
    }
    for category_id in &item.category_ids {
        if !tables.categories.iter().any(|c| c.id == *category_id) {
            return Err(StoreError::NotFound(format!("category {category_id}")));
        }
    }
    Ok(())
}

fn dedup_in_order(ids: &mut Vec<CategoryId>) {
    let mut seen = Vec::with_capacity(ids.len());
    ids.retain(|id| {
        if seen.contains(id) {
            false
        } else {
            seen.push(*id);
            true
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use pharmpilot_core::Role;

    use super::*;

    fn supplier(name: &str, email: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_owned(),
            email: Email::parse(email).unwrap(),
            phone: None,
            address: None,
            contact_person: None,
        }
    }

    fn item(name: &str, category_ids: Vec<CategoryId>) -> ItemData {
        ItemData {
            name: name.to_owned(),
            manufacturer: None,
            generic_name: None,
            formulation: None,
            strength: None,
            unit: None,
            schedule: None,
            description: None,
            units_per_pack: 1,
            price: Decimal::ONE,
            tax_rate: Decimal::ZERO,
            discount: Decimal::ZERO,
            reorder_level: 0,
            quantity_in_stock: 0,
            expiry_date: None,
            purchase_price: Decimal::ONE,
            purchase_date: None,
            is_active: true,
            is_available: true,
            supplier_id: None,
            category_ids,
        }
    }

    async fn category(store: &MemoryStore, name: &str) -> CategoryId {
        store
            .upsert_category(&NewCategory {
                name: name.to_owned(),
                description: None,
            })
            .await
            .unwrap()
            .record
            .id
    }

    #[tokio::test]
    async fn test_supplier_upsert_matches_by_email() {
        let store = MemoryStore::new();
        let first = store.upsert_supplier(&supplier("Acme", "a@x.com")).await.unwrap();
        let second = store
            .upsert_supplier(&supplier("Acme Renamed", "a@x.com"))
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.record, first.record);
        assert_eq!(store.suppliers().len(), 1);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_create_account_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let email = Email::parse("c@x.com").unwrap();
        let account = NewAccount::new(email, "Customer User", "hash".into(), Role::Customer);

        store.create_account(&account).await.unwrap();
        let err = store.create_account(&account).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.accounts().len(), 1);
        assert_eq!(store.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_first_item_by_name_is_oldest() {
        let store = MemoryStore::new();
        let first = store.create_item(&item("Panadol", vec![])).await.unwrap();
        store.create_item(&item("Panadol", vec![])).await.unwrap();

        let found = store.find_first_item_id_by_name("Panadol").await.unwrap();
        assert_eq!(found, Some(first));
        assert_eq!(store.find_first_item_id_by_name("panadol").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_append_keeps_existing_links() {
        let store = MemoryStore::new();
        let pain = category(&store, "Painkiller").await;
        let fever = category(&store, "Antipyretic").await;
        let id = store.create_item(&item("Panadol", vec![pain])).await.unwrap();

        store
            .update_item(id, &item("Panadol", vec![fever, fever]), CategoryLinkMode::Append)
            .await
            .unwrap();

        assert_eq!(store.items()[0].data.category_ids, vec![pain, fever]);
    }

    #[tokio::test]
    async fn test_update_replace_drops_stale_links() {
        let store = MemoryStore::new();
        let pain = category(&store, "Painkiller").await;
        let fever = category(&store, "Antipyretic").await;
        let id = store.create_item(&item("Panadol", vec![pain])).await.unwrap();

        store
            .update_item(id, &item("Panadol", vec![fever]), CategoryLinkMode::Replace)
            .await
            .unwrap();

        assert_eq!(store.items()[0].data.category_ids, vec![fever]);
    }

    #[tokio::test]
    async fn test_create_item_checks_foreign_keys() {
        let store = MemoryStore::new();
        let mut data = item("Ghost", vec![]);
        data.supplier_id = Some(SupplierId::generate());

        assert!(matches!(
            store.create_item(&data).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_and_disconnect() {
        let store = MemoryStore::new();
        store.fail_on(Operation::UpsertCategory);
        assert!(matches!(
            store
                .upsert_category(&NewCategory {
                    name: "X".into(),
                    description: None
                })
                .await,
            Err(StoreError::Database(_))
        ));

        store.disconnect().await;
        assert!(store.is_disconnected());
        assert!(store.find_first_item_id_by_name("X").await.is_err());
    }
}
