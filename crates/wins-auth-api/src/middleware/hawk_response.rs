//! Signs responses of Hawk routes with `Server-Authorization`.
//!
//! Runs inside [`hawk_authenticate`](super::hawk::hawk_authenticate) and
//! signs with the principal it left in the request extensions.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use wins_auth_core::hawk::SERVER_AUTHORIZATION_HEADER;
use wins_auth_core::HawkPrincipal;

pub async fn hawk_sign_response(request: Request, next: Next) -> Response {
    let Some(principal) = request.extensions().get::<HawkPrincipal>().cloned() else {
        // The router only installs this layer beneath Hawk authentication.
        tracing::error!(path = %request.uri().path(), "Response signing without a Hawk principal");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer response body for signing");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let signed = principal
        .respond(content_type, &bytes)
        .map_err(|e| e.to_string())
        .and_then(|value| HeaderValue::from_str(&value).map_err(|e| e.to_string()));

    match signed {
        Ok(value) => {
            parts.headers.insert(SERVER_AUTHORIZATION_HEADER, value);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(error = %e, credential_id = principal.credential_id(), "Failed to sign response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
