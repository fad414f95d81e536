//! Wire payloads for offline data reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[validate(length(min = 1, message = "userId must not be empty"))]
    pub user_id: String,
    #[serde(default)]
    pub diagnoses: Vec<SyncRecord>,
    pub last_sync_time: DateTime<Utc>,
}

/// A client-side diagnosis record. Only `id` and `updatedAt` carry merge
/// semantics; everything else is opaque to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub synced_at: DateTime<Utc>,
    pub updated_items: Vec<SyncRecord>,
}
