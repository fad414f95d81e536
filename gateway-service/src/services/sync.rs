//! Durable store for offline diagnosis reconciliation.
//!
//! Merge rule: last-write-wins per record id. An incoming record replaces
//! the stored copy only when strictly newer; on an exact timestamp tie the
//! stored copy wins, which keeps the operation idempotent. `updatedItems`
//! is every record newer than the client's `lastSyncTime` after the merge,
//! ordered by (updatedAt, id) with id as the stable secondary key.

use crate::dtos::SyncRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Client as MongoClient, Collection, Database, IndexModel,
    bson::{DateTime as BsonDateTime, doc},
    options::{FindOptions, IndexOptions, ReplaceOptions},
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Merges client records into the store and returns the records the
    /// server now considers updated since `last_sync`.
    async fn merge(
        &self,
        user_id: &str,
        incoming: &[SyncRecord],
        last_sync: DateTime<Utc>,
    ) -> Result<Vec<SyncRecord>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// True when the incoming copy should replace the stored one.
fn incoming_wins(stored: Option<&DateTime<Utc>>, incoming: &DateTime<Utc>) -> bool {
    match stored {
        None => true,
        Some(stored) => incoming > stored,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDiagnosis {
    user_id: String,
    record_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
    /// Opaque client fields, kept as serialized JSON for a lossless round-trip.
    payload: String,
}

impl StoredDiagnosis {
    fn from_record(user_id: &str, record: &SyncRecord) -> Result<Self, AppError> {
        let payload = serde_json::to_string(&record.fields)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Unserializable record: {e}")))?;
        Ok(Self {
            user_id: user_id.to_string(),
            record_id: record.id.clone(),
            updated_at: record.updated_at,
            payload,
        })
    }

    fn into_record(self) -> Result<SyncRecord, AppError> {
        let fields = serde_json::from_str(&self.payload)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Corrupt stored record: {e}")))?;
        Ok(SyncRecord {
            id: self.record_id,
            updated_at: self.updated_at,
            fields,
        })
    }
}

#[derive(Clone)]
pub struct MongoSyncStore {
    client: MongoClient,
    db: Database,
}

impl MongoSyncStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let diagnoses = self.diagnoses();

        let record_key_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "record_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_record_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        diagnoses
            .create_index(record_key_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_record index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let updated_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "updated_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_updated_idx".to_string())
                    .build(),
            )
            .build();
        diagnoses
            .create_index(updated_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_updated index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }

    fn diagnoses(&self) -> Collection<StoredDiagnosis> {
        self.db.collection("diagnoses")
    }
}

#[async_trait]
impl SyncStore for MongoSyncStore {
    async fn merge(
        &self,
        user_id: &str,
        incoming: &[SyncRecord],
        last_sync: DateTime<Utc>,
    ) -> Result<Vec<SyncRecord>, AppError> {
        let diagnoses = self.diagnoses();

        for record in incoming {
            let filter = doc! { "user_id": user_id, "record_id": &record.id };
            let stored = diagnoses.find_one(filter.clone(), None).await?;

            if incoming_wins(stored.map(|s| s.updated_at).as_ref(), &record.updated_at) {
                let replacement = StoredDiagnosis::from_record(user_id, record)?;
                diagnoses
                    .replace_one(
                        filter,
                        replacement,
                        ReplaceOptions::builder().upsert(true).build(),
                    )
                    .await?;
            }
        }

        let filter = doc! {
            "user_id": user_id,
            "updated_at": { "$gt": BsonDateTime::from_chrono(last_sync) },
        };
        let options = FindOptions::builder()
            .sort(doc! { "updated_at": 1, "record_id": 1 })
            .build();
        let updated: Vec<StoredDiagnosis> =
            diagnoses.find(filter, options).await?.try_collect().await?;

        updated.into_iter().map(|s| s.into_record()).collect()
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}

/// In-memory stand-in for tests; shares the merge rule with the Mongo
/// implementation.
pub struct InMemorySyncStore {
    records: std::sync::Mutex<std::collections::HashMap<(String, String), SyncRecord>>,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self {
            records: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemorySyncStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncStore for InMemorySyncStore {
    async fn merge(
        &self,
        user_id: &str,
        incoming: &[SyncRecord],
        last_sync: DateTime<Utc>,
    ) -> Result<Vec<SyncRecord>, AppError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Store mutex poisoned: {e}")))?;

        for record in incoming {
            let key = (user_id.to_string(), record.id.clone());
            let stored = records.get(&key).map(|r| r.updated_at);
            if incoming_wins(stored.as_ref(), &record.updated_at) {
                records.insert(key, record.clone());
            }
        }

        let mut updated: Vec<SyncRecord> = records
            .iter()
            .filter(|(key, record)| key.0 == user_id && record.updated_at > last_sync)
            .map(|(_, record)| record.clone())
            .collect();
        updated.sort_by(|a, b| {
            a.updated_at
                .cmp(&b.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(updated)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, updated_at: DateTime<Utc>) -> SyncRecord {
        let mut fields = serde_json::Map::new();
        fields.insert("crop".to_string(), serde_json::json!("tomato"));
        SyncRecord {
            id: id.to_string(),
            updated_at,
            fields,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn newer_incoming_wins() {
        assert!(incoming_wins(Some(&at(9)), &at(10)));
    }

    #[test]
    fn older_incoming_loses() {
        assert!(!incoming_wins(Some(&at(11)), &at(10)));
    }

    #[test]
    fn timestamp_tie_keeps_stored_copy() {
        assert!(!incoming_wins(Some(&at(10)), &at(10)));
    }

    #[test]
    fn unknown_record_is_accepted() {
        assert!(incoming_wins(None, &at(10)));
    }

    #[tokio::test]
    async fn merge_is_idempotent() {
        let store = InMemorySyncStore::new();
        let incoming = vec![record("d2", at(10)), record("d1", at(10))];

        let first = store.merge("farmer-1", &incoming, at(9)).await.unwrap();
        let second = store.merge("farmer-1", &incoming, at(9)).await.unwrap();
        assert_eq!(first, second);
        // stable secondary ordering by id
        assert_eq!(first[0].id, "d1");
        assert_eq!(first[1].id, "d2");
    }

    #[tokio::test]
    async fn merge_only_reports_records_after_last_sync() {
        let store = InMemorySyncStore::new();
        store
            .merge("farmer-1", &[record("old", at(8)), record("new", at(12))], at(0))
            .await
            .unwrap();

        let updated = store.merge("farmer-1", &[], at(10)).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, "new");
    }

    #[tokio::test]
    async fn merge_isolates_users() {
        let store = InMemorySyncStore::new();
        store
            .merge("farmer-1", &[record("d1", at(10))], at(0))
            .await
            .unwrap();

        let other = store.merge("farmer-2", &[], at(0)).await.unwrap();
        assert!(other.is_empty());
    }
}
