//! Settings database operations
//!
//! Key-value accessors over the `settings` table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use cpath_common::{Error, Result};

const LAST_CLEARED_AT: &str = "last_cleared_at";

/// When the aggregates were last deleted, if ever
pub async fn get_last_cleared_at(db: &SqlitePool) -> Result<Option<DateTime<Utc>>> {
    get_setting(db, LAST_CLEARED_AT).await
}

/// Record an aggregate deletion
pub async fn set_last_cleared_at(db: &SqlitePool, at: DateTime<Utc>) -> Result<()> {
    set_setting(db, LAST_CLEARED_AT, at.to_rfc3339()).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match row.and_then(|(value,)| value) {
        Some(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cpath_common::db::init_in_memory;

    #[tokio::test]
    async fn test_last_cleared_at_not_set() {
        let pool = init_in_memory().await.unwrap();

        let result = get_last_cleared_at(&pool).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_last_cleared_at_roundtrip_and_update() {
        let pool = init_in_memory().await.unwrap();
        let first = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 6, 7, 8, 9, 10).unwrap();

        set_last_cleared_at(&pool, first).await.unwrap();
        assert_eq!(get_last_cleared_at(&pool).await.unwrap(), Some(first));

        set_last_cleared_at(&pool, second).await.unwrap();
        assert_eq!(get_last_cleared_at(&pool).await.unwrap(), Some(second));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'last_cleared_at'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "Should have exactly one entry after update");
    }

    #[tokio::test]
    async fn test_corrupt_setting_is_config_error() {
        let pool = init_in_memory().await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('last_cleared_at', 'yesterday')")
            .execute(&pool)
            .await
            .unwrap();

        let result = get_last_cleared_at(&pool).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
