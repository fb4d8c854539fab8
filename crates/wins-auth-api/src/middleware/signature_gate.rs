//! Signature gate middleware.
//!
//! Every non-exempt route requires `X-Signature` to match one of the four
//! caller secrets over the full path and raw body. The matching caller is
//! added to the request extensions as [`SignedCaller`] for handlers and
//! per-caller permission checks.
//!
//! Failures answer 400 with an empty body.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use wins_auth_core::signature::SIGNATURE_HEADER;
use wins_auth_core::CallerName;

use crate::error::Rejection;
use crate::state::AppState;

/// Which trusted server signed the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedCaller {
    pub name: CallerName,
}

/// Full path including the query string, as the caller signed it.
pub(crate) fn full_path(request: &Request) -> &str {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}

pub async fn signature_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.gate.is_bypassed() {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    let mut request = Request::from_parts(parts, Body::from(bytes.clone()));

    let offered = request
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let path = full_path(&request);

    match state.gate.verify(offered, path, &bytes) {
        Ok(Some(name)) => {
            tracing::debug!(caller = %name, path, "Signature accepted");
            request.extensions_mut().insert(SignedCaller { name });
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(error) => {
            tracing::warn!(kind = error.kind(), path, "Signature rejected");
            Rejection(error).into_response()
        }
    }
}
