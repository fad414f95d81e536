pub mod ai;
pub mod market;
pub mod sync;
pub mod weather;

use service_core::error::AppError;

/// Method-router fallback for every route; yields the contract's
/// `{"error": "Method not allowed"}` body instead of axum's empty 405.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
