//! Postgres-backed item store.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | `RowNotFound` / no row returned | `NotFound` |
//! | column decode failure | `Decode` |
//! | anything else (database, pool, IO) | `Backend` |

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use labtrack_core::ItemId;
use labtrack_inventory::{InventoryItem, ItemDraft};

use super::r#trait::{ItemStore, StoreError};
use crate::changes::{ChangeFeed, ItemChange};

const SCHEMA: &str = include_str!("../../migrations/0001_inventory_items.sql");

const COLUMNS: &str = "id, name, cas_number, lot_number, expiry_date, location_description, \
     quantity_original, quantity_current, quantity_unit, price, supplier, catalog_number, \
     storage_conditions, safety_data, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: Arc<PgPool>,
    feed: ChangeFeed,
}

impl PostgresItemStore {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self {
            pool: Arc::new(pool),
            feed,
        }
    }

    /// Connect and make sure the table exists.
    pub async fn connect(database_url: &str, feed: ChangeFeed) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool, feed);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Apply the bundled schema (idempotent).
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        tracing::info!("inventory_items schema ready");
        Ok(())
    }
}

struct ItemRow(InventoryItem);

impl<'r> sqlx::FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow(InventoryItem {
            id: ItemId::from_uuid(row.try_get::<uuid::Uuid, _>("id")?),
            name: row.try_get("name")?,
            cas_number: row.try_get("cas_number")?,
            lot_number: row.try_get("lot_number")?,
            expiry_date: row.try_get::<Option<NaiveDate>, _>("expiry_date")?,
            location_description: row.try_get("location_description")?,
            quantity_original: row.try_get("quantity_original")?,
            quantity_current: row.try_get("quantity_current")?,
            quantity_unit: row.try_get("quantity_unit")?,
            price: row.try_get("price")?,
            supplier: row.try_get("supplier")?,
            catalog_number: row.try_get("catalog_number")?,
            storage_conditions: row.try_get("storage_conditions")?,
            safety_data: row.try_get("safety_data")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        }))
    }
}

#[async_trait::async_trait]
impl ItemStore for PostgresItemStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {COLUMNS} FROM inventory_items ORDER BY created_at DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get(&self, id: ItemId) -> Result<InventoryItem, StoreError> {
        sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?
        .map(|r| r.0)
        .ok_or(StoreError::NotFound(id))
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    async fn insert(&self, draft: ItemDraft) -> Result<InventoryItem, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO inventory_items (
                id, name, cas_number, lot_number, expiry_date, location_description,
                quantity_original, quantity_current, quantity_unit, price, supplier,
                catalog_number, storage_conditions, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(ItemId::new().as_uuid())
        .bind(&draft.name)
        .bind(&draft.cas_number)
        .bind(&draft.lot_number)
        .bind(draft.expiry_date)
        .bind(&draft.location_description)
        .bind(draft.quantity_current)
        .bind(&draft.quantity_unit)
        .bind(draft.price)
        .bind(&draft.supplier)
        .bind(&draft.catalog_number)
        .bind(&draft.storage_conditions)
        .bind(&draft.notes)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        let item = row.0;
        self.feed.publish(ItemChange::Inserted { item: item.clone() });
        Ok(item)
    }

    #[instrument(skip(self, draft), fields(item_id = %id), err)]
    async fn update(&self, id: ItemId, draft: ItemDraft) -> Result<InventoryItem, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items SET
                name = $2,
                quantity_current = $3,
                quantity_unit = $4,
                location_description = $5,
                expiry_date = $6,
                cas_number = $7,
                lot_number = $8,
                supplier = $9,
                catalog_number = $10,
                storage_conditions = $11,
                notes = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&draft.name)
        .bind(draft.quantity_current)
        .bind(&draft.quantity_unit)
        .bind(&draft.location_description)
        .bind(draft.expiry_date)
        .bind(&draft.cas_number)
        .bind(&draft.lot_number)
        .bind(&draft.supplier)
        .bind(&draft.catalog_number)
        .bind(&draft.storage_conditions)
        .bind(&draft.notes)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?
        .ok_or(StoreError::NotFound(id))?;

        let item = row.0;
        self.feed.publish(ItemChange::Updated { item: item.clone() });
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.feed.publish(ItemChange::Deleted { id });
        Ok(())
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Decode(format!("column {index} in {operation}: {source}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
