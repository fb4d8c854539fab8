//! Hawk authentication and scope middleware.
//!
//! Applied per route by the router. On success the [`HawkPrincipal`] is put
//! in the request extensions; the route's required scope (if any) is then
//! checked against it.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use wins_auth_core::{AuthError, HawkRequest, RequestTarget, Scope};

use super::signature_gate::full_path;
use crate::error::Rejection;
use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Middleware state for one Hawk-protected route.
#[derive(Clone)]
pub struct HawkRouteState {
    pub app: AppState,
    pub required_scope: Option<Scope>,
}

pub async fn hawk_authenticate(
    State(route): State<HawkRouteState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, route.app.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    let mut request = Request::from_parts(parts, Body::from(bytes.clone()));

    let headers = request.headers();
    let forwarded_for = forwarded_for(headers);
    let authorization = match headers.get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(kind = "malformed_header", "Authorization header is not valid UTF-8");
                return Rejection(AuthError::MalformedHeader(
                    "authorization header is not valid UTF-8".to_string(),
                ))
                .into_response();
            }
        },
    };
    let scheme = header_str(headers, FORWARDED_PROTO).unwrap_or(&*route.app.default_scheme);
    let (host, port) = request_origin(headers, request.uri(), scheme);

    let hawk_request = HawkRequest {
        target: RequestTarget {
            method: request.method().as_str(),
            resource: full_path(&request),
            host: &host,
            port,
        },
        content_type: header_str(headers, header::CONTENT_TYPE.as_str()).unwrap_or(""),
        body: &bytes,
        authorization,
        forwarded_for: forwarded_for.as_deref(),
    };

    let principal = match route.app.hawk.authenticate(&hawk_request).await {
        Ok(principal) => principal,
        Err(error) => return Rejection(error).into_response(),
    };

    if let Err(error) = route.app.hawk.authorize(&principal, route.required_scope) {
        return Rejection(error).into_response();
    }

    request.extensions_mut().insert(principal);
    next.run(request).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Every `X-Forwarded-For` line joined into one list, in arrival order.
///
/// A line that is not valid UTF-8 yields an empty list, which fails the IP
/// check.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let mut lines = headers.get_all(FORWARDED_FOR).iter().peekable();
    lines.peek()?;

    let joined: Result<Vec<&str>, _> = lines.map(|v| v.to_str()).collect();
    Some(joined.map(|lines| lines.join(", ")).unwrap_or_default())
}

/// Host and port the caller addressed, for the MAC.
///
/// Taken from `Host` (or the URI authority on HTTP/2); the port defaults
/// from the scheme.
fn request_origin(headers: &HeaderMap, uri: &Uri, scheme: &str) -> (String, u16) {
    let authority = header_str(headers, header::HOST.as_str())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("");

    let default_port = if scheme.eq_ignore_ascii_case("https") { 443 } else { 80 };

    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        // [v6]:port
        match rest.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':')),
            None => (authority, None),
        }
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    let port = port.and_then(|p| p.parse().ok()).unwrap_or(default_port);
    (host.to_lowercase(), port)
}
