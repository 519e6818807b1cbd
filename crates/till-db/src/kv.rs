//! # Key-Value Blob Store
//!
//! Every collection is one JSON document in the `kv_store` table.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read_or_else(key, default)                                             │
//! │       │                                                                 │
//! │       ├── row missing        ──► default()                              │
//! │       ├── JSON parses        ──► stored value                           │
//! │       └── JSON is corrupt    ──► warn! + default()                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Helpers are generic over the sqlx executor so they work on both the
//! pool and an open transaction (`&mut *tx`).

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Executor, Sqlite};
use tracing::{debug, warn};

use crate::error::DbResult;

/// Storage key names.
pub mod keys {
    pub const PRODUCTS: &str = "premium-pos-products";
    pub const CATEGORIES: &str = "premium-pos-categories";
    pub const COUPONS: &str = "pos-coupons";
    pub const BULK_RULES: &str = "pos-bulk-rules";
    pub const ORDERS: &str = "pos-orders";
    pub const RECEIPT_SETTINGS: &str = "pos-receipt-settings";
    pub const CUSTOMERS: &str = "pos-customers";
    pub const RECENT_CUSTOMERS: &str = "pos-recent-customers";
}

/// Raw stored text for `key`, if any.
pub async fn read_raw<'e, E>(executor: E, key: &str) -> DbResult<Option<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(executor)
        .await?;

    Ok(value)
}

/// Whether a value is stored under `key`.
pub async fn exists<'e, E>(executor: E, key: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_one(executor)
        .await?;

    Ok(count > 0)
}

/// Decodes the value under `key`, falling back to `default` when the key is
/// absent or its JSON is unreadable.
pub async fn read_or_else<'e, E, T, F>(executor: E, key: &str, default: F) -> DbResult<T>
where
    E: Executor<'e, Database = Sqlite>,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let Some(raw) = read_raw(executor, key).await? else {
        debug!(key, "No stored value, using default");
        return Ok(default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, error = %e, "Stored value is corrupt, falling back to default");
            Ok(default())
        }
    }
}

/// Encodes `value` and upserts it under `key`.
pub async fn write<'e, E, T>(executor: E, key: &str, value: &T) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)?;

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(executor)
    .await?;

    debug!(key, "Stored value written");
    Ok(())
}

/// Deletes `key`. Returns whether anything was removed.
pub async fn remove<'e, E>(executor: E, key: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(key)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let db = db().await;
        write(db.pool(), "k", &vec![1, 2, 3]).await.unwrap();

        let value: Vec<i32> = read_or_else(db.pool(), "k", Vec::new).await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        assert!(exists(db.pool(), "k").await.unwrap());

        write(db.pool(), "k", &vec![4]).await.unwrap();
        let value: Vec<i32> = read_or_else(db.pool(), "k", Vec::new).await.unwrap();
        assert_eq!(value, vec![4]);
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_fall_back() {
        let db = db().await;
        let value: Vec<i32> = read_or_else(db.pool(), "absent", || vec![9]).await.unwrap();
        assert_eq!(value, vec![9]);

        sqlx::query("INSERT INTO kv_store (key, value, updated_at) VALUES ('bad', '{oops', '')")
            .execute(db.pool())
            .await
            .unwrap();
        let value: Vec<i32> = read_or_else(db.pool(), "bad", || vec![7]).await.unwrap();
        assert_eq!(value, vec![7]);
    }

    #[tokio::test]
    async fn test_remove() {
        let db = db().await;
        write(db.pool(), "k", "v").await.unwrap();
        assert!(remove(db.pool(), "k").await.unwrap());
        assert!(!remove(db.pool(), "k").await.unwrap());
        assert!(read_raw(db.pool(), "k").await.unwrap().is_none());
    }
}
