//! Handler for offline data reconciliation.

use axum::{Json, extract::State};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{SyncRequest, SyncResult};
use crate::startup::AppState;

pub async fn sync_data(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncResult>, AppError> {
    req.validate()?;

    let updated_items = state
        .sync_store
        .merge(&req.user_id, &req.diagnoses, req.last_sync_time)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                user_id = %req.user_id,
                records = req.diagnoses.len(),
                "Diagnosis sync failed"
            );
            AppError::Upstream("Sync failed".to_string())
        })?;

    Ok(Json(SyncResult {
        success: true,
        synced_at: Utc::now(),
        updated_items,
    }))
}
