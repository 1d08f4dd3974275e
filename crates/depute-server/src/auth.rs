use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

/// Axum middleware that gates the refresh trigger behind the shared token.
///
/// Auth flow (evaluated in order):
/// 1. No token configured → 503, the trigger is disabled
/// 2. `Authorization: Bearer TOKEN` matches → passthrough
/// 3. Query param `?auth=TOKEN` matches → passthrough
/// 4. None matched → 401 JSON
pub async fn require_token(
    State(token): State<Option<Arc<str>>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(token) = token else {
        return json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error":"refresh trigger disabled: no token configured"}"#,
        );
    };

    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if bearer.is_some_and(|v| v.trim() == &*token) {
        return next.run(req).await;
    }

    if let Some(query) = req.uri().query() {
        if extract_auth_param(query).is_some_and(|v| v == &*token) {
            return next.run(req).await;
        }
    }

    tracing::warn!("Rejected refresh request to {}: invalid token", req.uri().path());
    json_response(StatusCode::UNAUTHORIZED, r#"{"error":"unauthorized"}"#)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn extract_auth_param(query: &str) -> Option<&str> {
    query.split('&').find_map(|kv| kv.strip_prefix("auth="))
}

fn json_response(status: StatusCode, body: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
