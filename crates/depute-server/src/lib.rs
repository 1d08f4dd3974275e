pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod tcp;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use state::AppState;
pub use tcp::serve_trigger;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let trigger = post(routes::refresh::trigger_refresh).route_layer(
        middleware::from_fn_with_state(app_state.token.clone(), auth::require_token),
    );

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Refresh status and trigger
        .route(
            "/api/refresh",
            get(routes::refresh::get_status).merge(trigger),
        )
        // Schedule
        .route("/api/schedule", get(routes::schedule::get_schedule))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve the HTTP API on a pre-bound listener.
///
/// Accepting a bound listener lets the caller read the actual port first
/// (useful when port `0` lets the OS pick one).
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = build_router(app_state);

    tracing::info!("HTTP API listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
