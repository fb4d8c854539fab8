//! Echoes which trusted server signed the request.

use axum::{Extension, Json};
use serde::Serialize;
use wins_auth_core::CallerName;

use crate::middleware::SignedCaller;

#[derive(Debug, Serialize)]
pub struct CallerResponse {
    /// `None` when the signature gate is bypassed.
    pub caller: Option<CallerName>,
}

/// GET|POST /whoami
pub async fn whoami(caller: Option<Extension<SignedCaller>>) -> Json<CallerResponse> {
    Json(CallerResponse {
        caller: caller.map(|Extension(c)| c.name),
    })
}
