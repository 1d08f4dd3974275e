use axum::extract::State;
use axum::Json;
use chrono::Local;
use depute_core::schedule::compute_time_for_update;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/schedule: next daily refresh and the seconds until it.
pub async fn get_schedule(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let (next, delay) = compute_time_for_update(&app.update_hour, Local::now().naive_local())?;
    Ok(Json(serde_json::json!({
        "next": next.format("%Y-%m-%d %H:%M:%S").to_string(),
        "in_seconds": delay.as_secs(),
    })))
}
