//! `PostgreSQL` implementation of [`SeedStore`].
//!
//! # Database: `app` schema
//!
//! ## Tables
//!
//! - `app.user` - Accounts (unique email)
//! - `app.customer` - Customer profiles (one per customer account)
//! - `app.supplier` - Suppliers (unique email)
//! - `app.category` / `app.report_category` - Unique by name
//! - `app.item` - Items (name not unique)
//! - `app.item_category` - Item/category links
//!
//! # Migrations
//!
//! Migrations live in `crates/seed/migrations/` and run via:
//! ```bash
//! cargo run -p pharmpilot-cli -- migrate
//! ```
//!
//! Upserts use `ON CONFLICT ... DO UPDATE SET <key> = EXCLUDED.<key>`: the
//! update touches nothing, but unlike `DO NOTHING` it still returns the row.
//! `xmax = 0` tells a fresh insert apart from a matched row.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;
use uuid::Uuid;

use pharmpilot_core::{CategoryId, Email, ItemId, ReportCategoryId, Role, SupplierId, UserId};

use super::{CategoryLinkMode, SeedStore, StoreError};
use crate::models::{
    Account, Category, ItemData, NewAccount, NewCategory, NewReportCategory, NewSupplier,
    ReportCategory, Supplier, Upserted,
};

/// Create a `PostgreSQL` connection pool for a seed run.
///
/// A seed run issues one statement at a time, so the pool stays small.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the bundled migrations.
///
/// # Errors
///
/// Returns `StoreError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: UserId,
    email: String,
    name: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: Role,
    is_active: bool,
    email_verified: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: parse_stored_email(&row.email)?,
            name: row.name,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            role: row.role,
            is_active: row.is_active,
            email_verified: row.email_verified,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: SupplierId,
    name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    contact_person: Option<String>,
    created: bool,
}

impl TryFrom<SupplierRow> for Upserted<Supplier> {
    type Error = StoreError;

    fn try_from(row: SupplierRow) -> Result<Self, Self::Error> {
        Ok(Self {
            record: Supplier {
                id: row.id,
                name: row.name,
                email: parse_stored_email(&row.email)?,
                phone: row.phone,
                address: row.address,
                contact_person: row.contact_person,
            },
            created: row.created,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NamedRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created: bool,
}

fn parse_stored_email(raw: &str) -> Result<Email, StoreError> {
    Email::parse(raw)
        .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))
}

// =============================================================================
// Store
// =============================================================================

/// Seed store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgSeedStore {
    pool: PgPool,
}

impl PgSeedStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection fails.
    pub async fn connect(database_url: &SecretString) -> Result<Self, StoreError> {
        Ok(Self::new(create_pool(database_url).await?))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SeedStore for PgSeedStore {
    #[instrument(skip_all, fields(email = %email))]
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, name, first_name, last_name, password_hash,
                   role, is_active, email_verified
            FROM app.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    #[instrument(skip_all, fields(email = %account.email, role = %account.role))]
    async fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO app.user
                (email, name, first_name, last_name, password_hash, role, is_active, email_verified)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
            RETURNING id, email, name, first_name, last_name, password_hash,
                      role, is_active, email_verified
            ",
        )
        .bind(account.email.as_str())
        .bind(&account.name)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(account.email_verified)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "account"))?;

        if let Some(profile) = account.customer_profile() {
            sqlx::query(
                r"
                INSERT INTO app.customer (user_id, name, email, address)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(row.id)
            .bind(&profile.name)
            .bind(profile.email.as_str())
            .bind(&profile.address)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "customer profile"))?;
        }

        tx.commit().await?;
        Account::try_from(row)
    }

    #[instrument(skip_all, fields(email = %supplier.email))]
    async fn upsert_supplier(
        &self,
        supplier: &NewSupplier,
    ) -> Result<Upserted<Supplier>, StoreError> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r"
            INSERT INTO app.supplier (name, email, phone, address, contact_person)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, name, email, phone, address, contact_person,
                      (xmax = 0) AS created
            ",
        )
        .bind(&supplier.name)
        .bind(supplier.email.as_str())
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.contact_person)
        .fetch_one(&self.pool)
        .await?;

        Upserted::try_from(row)
    }

    #[instrument(skip_all, fields(name = %category.name))]
    async fn upsert_category(
        &self,
        category: &NewCategory,
    ) -> Result<Upserted<Category>, StoreError> {
        let row = sqlx::query_as::<_, NamedRow>(
            r"
            INSERT INTO app.category (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description, (xmax = 0) AS created
            ",
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Upserted {
            record: Category {
                id: CategoryId::new(row.id),
                name: row.name,
                description: row.description,
            },
            created: row.created,
        })
    }

    #[instrument(skip_all, fields(name = %category.name))]
    async fn upsert_report_category(
        &self,
        category: &NewReportCategory,
    ) -> Result<Upserted<ReportCategory>, StoreError> {
        let row = sqlx::query_as::<_, NamedRow>(
            r"
            INSERT INTO app.report_category (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description, (xmax = 0) AS created
            ",
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Upserted {
            record: ReportCategory {
                id: ReportCategoryId::new(row.id),
                name: row.name,
                description: row.description,
            },
            created: row.created,
        })
    }

    async fn find_first_item_id_by_name(&self, name: &str) -> Result<Option<ItemId>, StoreError> {
        let id: Option<ItemId> = sqlx::query_scalar(
            r"
            SELECT id FROM app.item
            WHERE name = $1
            ORDER BY created_at, id
            LIMIT 1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    #[instrument(skip_all, fields(name = %item.name))]
    async fn create_item(&self, item: &ItemData) -> Result<ItemId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id: ItemId = sqlx::query_scalar(
            r"
            INSERT INTO app.item (
                name, manufacturer, generic_name, formulation, strength, unit, schedule,
                description, units_per_pack, price, tax_rate, discount, reorder_level,
                quantity_in_stock, expiry_date, purchase_price, purchase_date,
                is_active, is_available, supplier_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING id
            ",
        )
        .bind(&item.name)
        .bind(&item.manufacturer)
        .bind(&item.generic_name)
        .bind(&item.formulation)
        .bind(&item.strength)
        .bind(&item.unit)
        .bind(&item.schedule)
        .bind(&item.description)
        .bind(item.units_per_pack)
        .bind(item.price)
        .bind(item.tax_rate)
        .bind(item.discount)
        .bind(item.reorder_level)
        .bind(item.quantity_in_stock)
        .bind(item.expiry_date)
        .bind(item.purchase_price)
        .bind(item.purchase_date)
        .bind(item.is_active)
        .bind(item.is_available)
        .bind(item.supplier_id)
        .fetch_one(&mut *tx)
        .await?;

        connect_categories(&mut tx, id, &item.category_ids).await?;

        tx.commit().await?;
        Ok(id)
    }

    #[instrument(skip_all, fields(name = %item.name, id = %id))]
    async fn update_item(
        &self,
        id: ItemId,
        item: &ItemData,
        links: CategoryLinkMode,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE app.item SET
                name = $2, manufacturer = $3, generic_name = $4, formulation = $5,
                strength = $6, unit = $7, schedule = $8, description = $9,
                units_per_pack = $10, price = $11, tax_rate = $12, discount = $13,
                reorder_level = $14, quantity_in_stock = $15, expiry_date = $16,
                purchase_price = $17, purchase_date = $18, is_active = $19,
                is_available = $20, supplier_id = $21, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&item.name)
        .bind(&item.manufacturer)
        .bind(&item.generic_name)
        .bind(&item.formulation)
        .bind(&item.strength)
        .bind(&item.unit)
        .bind(&item.schedule)
        .bind(&item.description)
        .bind(item.units_per_pack)
        .bind(item.price)
        .bind(item.tax_rate)
        .bind(item.discount)
        .bind(item.reorder_level)
        .bind(item.quantity_in_stock)
        .bind(item.expiry_date)
        .bind(item.purchase_price)
        .bind(item.purchase_date)
        .bind(item.is_active)
        .bind(item.is_available)
        .bind(item.supplier_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("item {id}")));
        }

        if links == CategoryLinkMode::Replace {
            sqlx::query(
                r"
                DELETE FROM app.item_category
                WHERE item_id = $1 AND NOT (category_id = ANY($2))
                ",
            )
            .bind(id)
            .bind(category_uuids(&item.category_ids))
            .execute(&mut *tx)
            .await?;
        }

        connect_categories(&mut tx, id, &item.category_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn disconnect(&self) {
        self.pool.close().await;
    }
}

fn category_uuids(ids: &[CategoryId]) -> Vec<Uuid> {
    ids.iter().map(CategoryId::as_uuid).collect()
}

/// Insert item/category links that are not already present.
async fn connect_categories(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: ItemId,
    category_ids: &[CategoryId],
) -> Result<(), StoreError> {
    if category_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r"
        INSERT INTO app.item_category (item_id, category_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(item_id)
    .bind(category_uuids(category_ids))
    .execute(&mut **tx)
    .await?;

    Ok(())
}
