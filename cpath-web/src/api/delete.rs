//! Data reset

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::db::{accumulator, settings};
use crate::{submissions, ApiError, ApiResult, AppState};

/// Response of `POST /delete`
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub log_deleted: bool,
    pub rows_cleared: u64,
}

/// POST /delete
///
/// Removes the submissions log and every aggregate. Refused unless
/// `allow_delete` is set in the config file.
pub async fn delete_data(State(state): State<AppState>) -> ApiResult<Json<DeleteResponse>> {
    if !state.config.allow_delete {
        return Err(ApiError::Forbidden(
            "deleting data is disabled (set allow_delete = true)".to_string(),
        ));
    }

    let log_deleted = submissions::delete_log(&state.config.submissions_log).await?;
    let rows_cleared = accumulator::clear(&state.db).await?;
    settings::set_last_cleared_at(&state.db, Utc::now()).await?;

    warn!(log_deleted, rows_cleared, "All collected data deleted");

    Ok(Json(DeleteResponse {
        log_deleted,
        rows_cleared,
    }))
}
