use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/refresh: whether an attempt is in flight, and the last report.
///
/// Never waits on the refresh gate.
pub async fn get_status(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "refreshing": app.coordinator.is_refreshing(),
        "last": app.coordinator.last_report(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    /// Also refresh actors and groups. Defaults to `true`.
    pub actors: Option<bool>,
}

/// POST /api/refresh: run one refresh attempt and return its outcome.
///
/// Waits behind any attempt already in flight. The attempt runs on its own
/// task, so it completes even if the client hangs up.
pub async fn trigger_refresh(
    State(app): State<AppState>,
    Query(params): Query<TriggerParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actors = params.actors.unwrap_or(true);
    tracing::info!("Update requested over HTTP (actors and groups: {actors})");
    let coordinator = app.coordinator.clone();
    let outcome = tokio::spawn(async move { coordinator.refresh(actors).await }).await?;
    Ok(Json(serde_json::json!({ "outcome": outcome })))
}
