//! Activity stream feed consumed by the Activity Stream service over Hawk.

use axum::{Extension, Json};
use serde_json::{json, Value};
use wins_auth_core::HawkPrincipal;

/// GET /activity-stream/
///
/// Returns an empty ordered collection page; the feed contents come from
/// the wins data layer, which sits outside this service.
pub async fn activity_stream(Extension(principal): Extension<HawkPrincipal>) -> Json<Value> {
    tracing::info!(credential_id = principal.credential_id(), "Serving activity stream page");
    Json(json!({
        "@context": "https://www.w3.org/ns/activitystreams",
        "type": "Collection",
        "orderedItems": [],
        "next": null,
    }))
}
