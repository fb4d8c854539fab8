//! HTTP rendering of authentication failures.
//!
//! Callers only see the failure category; which check failed is logged, not
//! returned.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wins_auth_core::hawk::WWW_AUTHENTICATE_VALUE;
use wins_auth_core::{AuthError, AuthFailure};

const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
const INCORRECT: &str = "Incorrect authentication credentials.";
const FORBIDDEN: &str = "You do not have permission to perform this action.";

/// An [`AuthError`] on its way to becoming a response.
#[derive(Debug)]
pub struct Rejection(pub AuthError);

impl From<AuthError> for Rejection {
    fn from(error: AuthError) -> Self {
        Self(error)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self.0.failure() {
            AuthFailure::BadRequest => StatusCode::BAD_REQUEST.into_response(),
            AuthFailure::NotAuthenticated => unauthorized(NOT_PROVIDED),
            AuthFailure::AuthenticationFailed => unauthorized(INCORRECT),
            AuthFailure::Forbidden => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": FORBIDDEN }))).into_response()
            }
        }
    }
}

fn unauthorized(detail: &str) -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use wins_auth_core::Scope;

    #[test]
    fn test_signature_failure_is_bare_400() {
        let response = Rejection(AuthError::SignatureMismatch).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_hawk_failures_are_401_with_challenge() {
        for error in [
            AuthError::NoCredentials,
            AuthError::BadMac,
            AuthError::UntrustedIp("6.6.6.6".to_string()),
        ] {
            let response = Rejection(error).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Hawk");
        }
    }

    #[test]
    fn test_scope_failure_is_403() {
        let response = Rejection(AuthError::InsufficientScope {
            required: Scope::DataHub,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
