use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dates::{format_key_date, parse_key_date};
use crate::entities::{kv_entry, snapshot_date};
use crate::error::AppError;

/// String-keyed JSON persistence plus the index of dated daily snapshots.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError>;

    async fn index_snapshot_date(&self, date: NaiveDate) -> Result<(), AppError>;

    /// Indexed dates, ascending.
    async fn snapshot_dates(&self) -> Result<Vec<NaiveDate>, AppError>;
}

pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let Some(entry) = kv_entry::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&entry.payload)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        let active = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            payload: Set(serde_json::to_string(&value)?),
            updated_at: Set(Utc::now()),
        };
        kv_entry::Entity::insert(active)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Payload, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        debug!(key, "stored entry");
        Ok(())
    }

    async fn index_snapshot_date(&self, date: NaiveDate) -> Result<(), AppError> {
        let active = snapshot_date::ActiveModel {
            date: Set(format_key_date(date)),
            recorded_at: Set(Utc::now()),
        };
        let result = snapshot_date::Entity::insert(active)
            .on_conflict(
                OnConflict::column(snapshot_date::Column::Date)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn snapshot_dates(&self) -> Result<Vec<NaiveDate>, AppError> {
        let rows = snapshot_date::Entity::find()
            .order_by_asc(snapshot_date::Column::Date)
            .all(&self.db)
            .await?;
        let mut dates = Vec::with_capacity(rows.len());
        for row in rows {
            match parse_key_date(&row.date) {
                Some(date) => dates.push(date),
                None => warn!(value = %row.date, "skipping malformed snapshot date"),
            }
        }
        Ok(dates)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().expect("temp dir");
        let db_path = db::resolve_db_path(dir.path());
        db::ensure_parent_dir(&db_path).expect("ensure parent");
        let db = db::connect(&db_path).await.expect("connect db");
        db::ensure_schema(&db).await.expect("ensure schema");
        (dir, SqliteStore::new(db))
    }

    fn date(value: &str) -> NaiveDate {
        parse_key_date(value).expect("valid date")
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let (_dir, store) = setup_store().await;
        assert_eq!(store.get("monthly-goals").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let (_dir, store) = setup_store().await;
        store
            .set("yearly-goals", json!([{"title": "first"}]))
            .await
            .expect("set first");
        store
            .set("yearly-goals", json!([{"title": "second"}]))
            .await
            .expect("set second");
        let value = store.get("yearly-goals").await.expect("get");
        assert_eq!(value, Some(json!([{"title": "second"}])));
    }

    #[tokio::test]
    async fn snapshot_dates_are_unique_and_sorted() {
        let (_dir, store) = setup_store().await;
        for value in ["2026-10-15", "2026-10-13", "2026-10-15"] {
            store
                .index_snapshot_date(date(value))
                .await
                .expect("index date");
        }
        let dates = store.snapshot_dates().await.expect("dates");
        assert_eq!(dates, vec![date("2026-10-13"), date("2026-10-15")]);
    }
}
