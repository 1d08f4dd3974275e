use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE stream that emits `refresh` with the report of every
/// finished attempt.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.coordinator.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        // Lagged receivers skip what they missed.
        let report = msg.ok()?;
        Event::default()
            .event("refresh")
            .json_data(&report)
            .ok()
            .map(Ok::<Event, Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
