use axum::{extract::State, Json};

use gstr_common::db::alerts::{recent_alerts, ALERT_FEED_LIMIT};
use gstr_common::models::Alert;

use crate::{ApiResult, AppState};

/// GET /api/alerts
pub async fn list_alerts(State(state): State<AppState>) -> ApiResult<Json<Vec<Alert>>> {
    Ok(Json(recent_alerts(&state.db, ALERT_FEED_LIMIT).await?))
}
