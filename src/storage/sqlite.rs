//! SQLite storage backend using sqlx.
//!
//! Provides `SqliteOrderStore`, an `OrderStore` backed by a single `orders`
//! table via `sqlx::SqlitePool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `sqlite` feature flag (enabled by default).
//!
//! # Schema
//!
//! One row per order. Booleans are stored as 0/1 integers, measurements as a
//! single `|`-delimited text column, and `order_number` carries a unique
//! constraint. The schema version lives in `PRAGMA user_version`; a mismatch
//! drops and recreates the table, losing all rows.

use crate::core::{Order, OrderStatus, OrderStore, StorageError};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Version written to `PRAGMA user_version` once the table is created
pub const SCHEMA_VERSION: i64 = 2;

const CREATE_ORDERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_number INTEGER NOT NULL UNIQUE,
    customer_number TEXT NOT NULL,
    delivery_date TEXT NOT NULL,
    shirts INTEGER DEFAULT 0,
    pants INTEGER DEFAULT 0,
    shorts INTEGER DEFAULT 0,
    total_price REAL NOT NULL,
    status TEXT DEFAULT 'pending',
    is_starred INTEGER DEFAULT 0,
    is_ready INTEGER DEFAULT 0,
    is_delivered INTEGER DEFAULT 0,
    measurements TEXT DEFAULT '',
    image_uri TEXT DEFAULT NULL
)";

const ORDER_SELECT: &str = "SELECT id, order_number, customer_number, delivery_date, shirts, pants, shorts, total_price, status, is_starred, is_ready, is_delivered, measurements, image_uri FROM orders";

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Create the `orders` table, or rebuild it when the stored version differs.
///
/// Safe to call on every startup. A version bump is destructive: the old
/// table is dropped, not migrated.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| anyhow!("Failed to read schema version: {}", e))?;

    if version != SCHEMA_VERSION {
        tracing::warn!(
            stored = version,
            expected = SCHEMA_VERSION,
            "Schema version mismatch, recreating orders table"
        );
        sqlx::query("DROP TABLE IF EXISTS orders")
            .execute(pool)
            .await
            .map_err(|e| anyhow!("Failed to drop orders table: {}", e))?;
    }

    sqlx::query(CREATE_ORDERS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow!("Failed to create orders table: {}", e))?;

    if version != SCHEMA_VERSION {
        // PRAGMA does not take bound parameters
        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(pool)
            .await
            .map_err(|e| anyhow!("Failed to write schema version: {}", e))?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: i64,
    customer_number: String,
    delivery_date: String,
    shirts: i64,
    pants: i64,
    shorts: i64,
    total_price: f64,
    status: Option<String>,
    is_starred: bool,
    is_ready: bool,
    is_delivered: bool,
    measurements: Option<String>,
    image_uri: Option<String>,
}

impl OrderRow {
    fn count(order_number: i64, column: &str, value: i64) -> Result<u32> {
        u32::try_from(value).map_err(|_| {
            StorageError::InvalidRow {
                order_number,
                message: format!("{} = {} is not a valid count", column, value),
            }
            .into()
        })
    }

    fn into_order(self) -> Result<Order> {
        let n = self.order_number;
        Ok(Order {
            id: self.id,
            order_number: n,
            customer_number: self.customer_number,
            delivery_date: self.delivery_date,
            shirts: Self::count(n, "shirts", self.shirts)?,
            pants: Self::count(n, "pants", self.pants)?,
            shorts: Self::count(n, "shorts", self.shorts)?,
            total_price: self.total_price,
            status: self
                .status
                .map(OrderStatus::from)
                .unwrap_or(OrderStatus::Pending),
            is_starred: self.is_starred,
            is_ready: self.is_ready,
            is_delivered: self.is_delivered,
            measurements: self.measurements.unwrap_or_default(),
            image_uri: self.image_uri,
        })
    }
}

// ---------------------------------------------------------------------------
// SqliteOrderStore
// ---------------------------------------------------------------------------

/// Order storage backed by SQLite.
///
/// # Example
///
/// ```rust,ignore
/// use measureon::storage::SqliteOrderStore;
///
/// let store = SqliteOrderStore::connect("sqlite://measureon.db").await?;
/// let order = store.insert(order).await?;
/// ```
#[derive(Clone, Debug)]
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    /// Wrap an existing pool; the caller is responsible for [`ensure_schema`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and prepare the schema
    ///
    /// A single connection is used: SQLite allows one writer at a time, and
    /// `sqlite::memory:` databases are private to their connection. The
    /// connection is never retired, so an in-memory database lives as long
    /// as the store.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database url '{}'", url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| anyhow!("Failed to open database '{}': {}", url, e))?;

        ensure_schema(&pool).await?;
        tracing::debug!(url, "Order database ready");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        let result = sqlx::query(
            "INSERT INTO orders (order_number, customer_number, delivery_date, shirts, pants, shorts, total_price, status, is_starred, is_ready, is_delivered, measurements, image_uri) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.order_number)
        .bind(&order.customer_number)
        .bind(&order.delivery_date)
        .bind(i64::from(order.shirts))
        .bind(i64::from(order.pants))
        .bind(i64::from(order.shorts))
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.is_starred)
        .bind(order.is_ready)
        .bind(order.is_delivered)
        .bind(&order.measurements)
        .bind(&order.image_uri)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateOrderNumber(order.order_number).into()
            } else {
                anyhow!("Failed to insert order #{}: {}", order.order_number, e)
            }
        })?;

        Ok(Order {
            id: result.last_insert_rowid(),
            ..order
        })
    }

    async fn update(&self, order: Order) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders \
             SET customer_number = ?, delivery_date = ?, shirts = ?, pants = ?, shorts = ?, \
                 total_price = ?, status = ?, is_starred = ?, is_ready = ?, is_delivered = ?, \
                 measurements = ?, image_uri = ? \
             WHERE order_number = ?",
        )
        .bind(&order.customer_number)
        .bind(&order.delivery_date)
        .bind(i64::from(order.shirts))
        .bind(i64::from(order.pants))
        .bind(i64::from(order.shorts))
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.is_starred)
        .bind(order.is_ready)
        .bind(order.is_delivered)
        .bind(&order.measurements)
        .bind(&order.image_uri)
        .bind(order.order_number)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to update order #{}: {}", order.order_number, e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, order_number: i64) -> Result<()> {
        sqlx::query("DELETE FROM orders WHERE order_number = ?")
            .bind(order_number)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to delete order #{}: {}", order_number, e))?;

        Ok(())
    }

    async fn get(&self, order_number: i64) -> Result<Option<Order>> {
        let sql = format!("{} WHERE order_number = ?", ORDER_SELECT);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to get order #{}: {}", order_number, e))?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let sql = format!("{} ORDER BY id", ORDER_SELECT);
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to list orders: {}", e))?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn max_order_number(&self) -> Result<Option<i64>> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(order_number) FROM orders")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to read max order number: {}", e))?;

        Ok(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    fn row(shirts: i64) -> OrderRow {
        OrderRow {
            id: 1,
            order_number: 10,
            customer_number: "0300".to_string(),
            delivery_date: "2024-3-15".to_string(),
            shirts,
            pants: 0,
            shorts: 2,
            total_price: 1250.0,
            status: Some("ready".to_string()),
            is_starred: true,
            is_ready: true,
            is_delivered: false,
            measurements: Some("A|B|C".to_string()),
            image_uri: None,
        }
    }

    #[test]
    fn row_maps_into_order() {
        let order = row(1).into_order().unwrap();
        assert_eq!(order.order_number, 10);
        assert_eq!(order.shirts, 1);
        assert_eq!(order.status, OrderStatus::Ready);
        assert!(order.is_starred);
        assert_eq!(order.measurements().shirt, "A");
    }

    #[test]
    fn row_with_negative_count_is_rejected() {
        let err = row(-1).into_order().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::InvalidRow { order_number: 10, .. })
        ));
    }

    #[test]
    fn row_with_null_status_defaults_to_pending() {
        let mut r = row(0);
        r.status = None;
        r.measurements = None;
        let order = r.into_order().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.measurements, "");
    }

    #[tokio::test]
    async fn ensure_schema_sets_version() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();

        let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent_and_keeps_rows() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO orders (order_number, customer_number, delivery_date, total_price) VALUES (1, '0300', '2024-1-1', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        ensure_schema(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn ensure_schema_drops_table_on_version_mismatch() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO orders (order_number, customer_number, delivery_date, total_price) VALUES (1, '0300', '2024-1-1', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("PRAGMA user_version = 1")
            .execute(&pool)
            .await
            .unwrap();

        ensure_schema(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn connect_keeps_its_connection_alive() {
        let store = SqliteOrderStore::connect("sqlite::memory:").await.unwrap();

        let options = store.pool().options();
        assert_eq!(options.get_max_connections(), 1);
        assert!(options.get_idle_timeout().is_none());
        assert!(options.get_max_lifetime().is_none());
    }

    #[tokio::test]
    async fn update_reports_whether_a_row_changed() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        let store = SqliteOrderStore::new(pool);

        let order = row(1).into_order().unwrap();
        assert!(!store.update(order.clone()).await.unwrap());

        store.insert(order.clone()).await.unwrap();
        assert!(store.update(order).await.unwrap());
    }

    #[tokio::test]
    async fn booleans_are_stored_as_integers() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.unwrap();
        let store = SqliteOrderStore::new(pool.clone());

        let mut order = row(1).into_order().unwrap();
        order.id = 0;
        store.insert(order).await.unwrap();

        let (starred, delivered): (i64, i64) =
            sqlx::query_as("SELECT is_starred, is_delivered FROM orders WHERE order_number = 10")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(starred, 1);
        assert_eq!(delivered, 0);
    }
}
