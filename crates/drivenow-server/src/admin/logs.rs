use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Most recent audit events, newest first.
///
/// `limit` defaults to `auth.admin_logs_default` and is capped at
/// `auth.admin_logs_max`.
pub async fn recent_logs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = state.auth_config.clamp_log_limit(query.limit);
    let logs = state.audit.list_recent(limit).await?;
    Ok(Json(json!({
        "success": true,
        "logs": logs,
    })))
}
