use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::models::TrackedProduct;
use crate::utils::error::PersistenceError;

/// A stored row read back as a record, or the reason it could not be.
pub type StoredProduct = Result<TrackedProduct, PersistenceError>;

/// Keyed persistence of tracked listings. Arithmetic lives in
/// `core::aggregation`; implementations only store what they are given.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Create the schema if it does not exist yet.
    async fn init(&self) -> Result<(), PersistenceError>;

    /// Write the record unconditionally, replacing any row with the same URL.
    async fn insert_or_replace(&self, product: &TrackedProduct) -> Result<(), PersistenceError>;

    /// Overwrite the row for `merged.url` only while it still holds `prior`
    /// (same `last_updated`). Returns `false` when the row was removed or
    /// rewritten after `prior` was read.
    async fn merge_update(&self, prior: &TrackedProduct, merged: &TrackedProduct) -> Result<bool, PersistenceError>;

    /// Delete by URL. Returns whether a row was removed.
    async fn remove(&self, url: &str) -> Result<bool, PersistenceError>;

    async fn get(&self, url: &str) -> Result<Option<TrackedProduct>, PersistenceError>;

    /// Every row ordered by URL. A row that cannot be decoded comes back as
    /// its own `Err` without hiding the others.
    async fn list_all(&self) -> Result<Vec<StoredProduct>, PersistenceError>;
}

pub struct SqliteProductStore {
    pool: SqlitePool,
}

// Prices are stored as decimal text so no precision is lost in SQLite's REAL.
#[derive(Debug, FromRow)]
struct ProductRow {
    url: String,
    title: String,
    current_price: String,
    lowest_price: String,
    highest_price: String,
    alt_price: String,
    last_updated: DateTime<Utc>,
}

impl TryFrom<ProductRow> for TrackedProduct {
    type Error = PersistenceError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let decimal = |text: &str, column: &'static str| {
            Decimal::from_str(text).map_err(|_| PersistenceError::CorruptRow {
                url: row.url.clone(),
                column,
            })
        };

        Ok(TrackedProduct {
            current_price: decimal(&row.current_price, "current_price")?,
            lowest_price: decimal(&row.lowest_price, "lowest_price")?,
            highest_price: decimal(&row.highest_price, "highest_price")?,
            alt_price: decimal(&row.alt_price, "alt_price")?,
            url: row.url.clone(),
            title: row.title,
            last_updated: row.last_updated,
        })
    }
}

const SELECT_PRODUCTS: &str = r#"
    SELECT url, title, current_price, lowest_price, highest_price, alt_price, last_updated
    FROM products
"#;

impl SqliteProductStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .connect(&config.url)
            .await?;

        tracing::debug!("Connected to product database at {}", config.url);
        Ok(Self { pool })
    }

    /// Single-connection in-memory database. Every SQLite connection to
    /// `:memory:` sees its own database, so the pool must never open a second
    /// one or recycle the first.
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn init(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                current_price TEXT NOT NULL,
                lowest_price TEXT NOT NULL,
                highest_price TEXT NOT NULL,
                alt_price TEXT NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_or_replace(&self, product: &TrackedProduct) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO products
                (url, title, current_price, lowest_price, highest_price, alt_price, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.url)
        .bind(&product.title)
        .bind(product.current_price.to_string())
        .bind(product.lowest_price.to_string())
        .bind(product.highest_price.to_string())
        .bind(product.alt_price.to_string())
        .bind(product.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn merge_update(&self, prior: &TrackedProduct, merged: &TrackedProduct) -> Result<bool, PersistenceError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET title = ?,
                current_price = ?,
                lowest_price = ?,
                highest_price = ?,
                alt_price = ?,
                last_updated = ?
            WHERE url = ? AND last_updated = ?
            "#,
        )
        .bind(&merged.title)
        .bind(merged.current_price.to_string())
        .bind(merged.lowest_price.to_string())
        .bind(merged.highest_price.to_string())
        .bind(merged.alt_price.to_string())
        .bind(merged.last_updated)
        .bind(&merged.url)
        .bind(prior.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, url: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM products WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, url: &str) -> Result<Option<TrackedProduct>, PersistenceError> {
        let query = format!("{} WHERE url = ?", SELECT_PRODUCTS);
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TrackedProduct::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<StoredProduct>, PersistenceError> {
        let query = format!("{} ORDER BY url", SELECT_PRODUCTS);
        let rows = sqlx::query_as::<_, ProductRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(TrackedProduct::try_from).collect())
    }
}
