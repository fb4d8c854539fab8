//! Route configuration
//!
//! Each route is registered together with a [`RouteAuth`] declaring how it is
//! protected, and [`protect`] turns that declaration into middleware layers.
//! The layers run outermost first:
//!
//! 1. **Signature gate** unless the route is exempt
//! 2. **Hawk authentication + scope** for Hawk routes
//! 3. **Response signing** for Hawk routes that opt in

use axum::{
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use wins_auth_core::Scope;

use crate::handlers;
use crate::middleware::{hawk_authenticate, hawk_sign_response, signature_gate, HawkRouteState};
use crate::state::AppState;

/// Hawk requirements of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HawkPolicy {
    /// `None` admits any authenticated credential.
    pub required_scope: Option<Scope>,
    /// Attach `Server-Authorization` to responses.
    pub sign_response: bool,
}

/// How a route is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAuth {
    /// Skip the signature gate.
    pub exempt: bool,
    pub hawk: Option<HawkPolicy>,
}

impl RouteAuth {
    /// Signature gate only. The default for application routes.
    pub fn signed() -> Self {
        Self {
            exempt: false,
            hawk: None,
        }
    }

    /// No authentication at all (infrastructure probes).
    pub fn exempt() -> Self {
        Self {
            exempt: true,
            hawk: None,
        }
    }

    /// Hawk instead of the signature gate: external callers never hold the
    /// caller secrets.
    pub fn hawk(required_scope: Option<Scope>) -> Self {
        Self {
            exempt: true,
            hawk: Some(HawkPolicy {
                required_scope,
                sign_response: false,
            }),
        }
    }

    /// Sign responses. Only meaningful on Hawk routes.
    pub fn with_signed_response(mut self) -> Self {
        if let Some(hawk) = self.hawk.as_mut() {
            hawk.sign_response = true;
        }
        self
    }
}

/// Wrap a route in the layers its [`RouteAuth`] declares.
pub fn protect(
    state: &AppState,
    auth: RouteAuth,
    mut route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    if let Some(hawk) = auth.hawk {
        if hawk.sign_response {
            route = route.layer(middleware::from_fn(hawk_sign_response));
        }
        route = route.layer(middleware::from_fn_with_state(
            HawkRouteState {
                app: state.clone(),
                required_scope: hawk.required_scope,
            },
            hawk_authenticate,
        ));
    }

    if !auth.exempt {
        route = route.layer(middleware::from_fn_with_state(state.clone(), signature_gate));
    }

    route
}

/// Create the application router
///
/// ## Routes
/// - GET /health - Health probe (exempt)
/// - GET|POST /whoami - Signed caller echo (signature gate)
/// - GET /activity-stream/ - Activity stream feed (Hawk, `activity_stream`, signed response)
/// - GET /datasets/ - Data Flow datasets (Hawk, `data_flow_api`)
pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;
    let routes: [(&str, RouteAuth, MethodRouter<AppState>); 4] = [
        ("/health", RouteAuth::exempt(), get(handlers::health)),
        (
            "/whoami",
            RouteAuth::signed(),
            get(handlers::whoami).post(handlers::whoami),
        ),
        (
            "/activity-stream/",
            RouteAuth::hawk(Some(Scope::ActivityStream)).with_signed_response(),
            get(handlers::activity_stream),
        ),
        (
            "/datasets/",
            RouteAuth::hawk(Some(Scope::DataFlowApi)),
            get(handlers::datasets),
        ),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, auth, route)| {
            router.route(path, protect(&state, auth, route))
        })
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, HeaderValue, Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use tower::ServiceExt; // For `oneshot`
    use wins_auth_core::hawk::{to_header_value, Header, SERVER_AUTHORIZATION_HEADER};
    use wins_auth_core::signature::sign;
    use wins_auth_core::{HawkClient, RequestTarget};

    use crate::state::test_support::{test_state, DATA_SECRET, UI_SECRET};

    const HOST: &str = "wins.example.com";
    const FORWARDED_FOR: &str = "1.2.3.4, 10.0.0.5, 10.0.0.6";

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn target(resource: &'static str) -> RequestTarget<'static> {
        RequestTarget {
            method: "GET",
            resource,
            host: HOST,
            port: 80,
        }
    }

    fn hawk_header(id: &str, key: &str, resource: &'static str, nonce: &str) -> Header {
        HawkClient::new(id, key)
            .sign_with(&target(resource), "", b"", std::time::SystemTime::now(), nonce, None)
            .unwrap()
    }

    fn hawk_request(resource: &str, authorization: &str, forwarded_for: &str) -> Request<Body> {
        Request::builder()
            .uri(resource)
            .header(header::HOST, HOST)
            .header(header::AUTHORIZATION, authorization)
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_exempt() {
        let response = create_router(test_state(false))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsigned_request_rejected_with_bare_400() {
        let response = create_router(test_state(false))
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_signed_request_tags_caller() {
        let response = create_router(test_state(false))
            .oneshot(
                Request::builder()
                    .uri("/whoami?page=2")
                    .header("x-signature", sign(DATA_SECRET, "/whoami?page=2", b""))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["caller"], "data");
    }

    #[tokio::test]
    async fn test_signature_covers_body() {
        let body = br#"{"company_name": "Acme"}"#;
        let signature = sign(UI_SECRET, "/whoami", body);

        let response = create_router(test_state(false))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/whoami")
                    .header("x-signature", &signature)
                    .body(Body::from(&body[..]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["caller"], "ui");

        let response = create_router(test_state(false))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/whoami")
                    .header("x-signature", &signature)
                    .body(Body::from(r#"{"company_name": "Evil"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_debug_bypass() {
        let response = create_router(test_state(true))
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["caller"].is_null());
    }

    #[tokio::test]
    async fn test_activity_stream_round_trip_and_replay() {
        let app = create_router(test_state(false));
        let sent = hawk_header("activity-stream-id", "activity-stream-key", "/activity-stream/", "abc123");
        let authorization = to_header_value(&sent);

        let response = app
            .clone()
            .oneshot(hawk_request("/activity-stream/", &authorization, FORWARDED_FOR))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let server_authorization = response.headers()[SERVER_AUTHORIZATION_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let client = HawkClient::new("activity-stream-id", "activity-stream-key");
        client
            .verify_response(&sent, &target("/activity-stream/"), &server_authorization, &content_type, &bytes)
            .unwrap();

        let mut tampered = bytes.to_vec();
        tampered.push(b' ');
        assert!(client
            .verify_response(&sent, &target("/activity-stream/"), &server_authorization, &content_type, &tampered)
            .is_err());

        let replay = app
            .oneshot(hawk_request("/activity-stream/", &authorization, FORWARDED_FOR))
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(replay.headers()[header::WWW_AUTHENTICATE], "Hawk");
    }

    #[tokio::test]
    async fn test_hawk_route_without_authorization() {
        let response = create_router(test_state(false))
            .oneshot(
                Request::builder()
                    .uri("/activity-stream/")
                    .header(header::HOST, HOST)
                    .header("x-forwarded-for", FORWARDED_FOR)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Hawk");
        assert_eq!(
            body_json(response).await["detail"],
            "Authentication credentials were not provided."
        );
    }

    #[tokio::test]
    async fn test_hawk_ip_rejection_despite_valid_mac() {
        let app = create_router(test_state(false));

        let single_hop = to_header_value(&hawk_header(
            "activity-stream-id",
            "activity-stream-key",
            "/activity-stream/",
            "n1",
        ));
        let response = app
            .clone()
            .oneshot(hawk_request("/activity-stream/", &single_hop, "10.0.0.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["detail"],
            "Incorrect authentication credentials."
        );

        let untrusted = to_header_value(&hawk_header(
            "activity-stream-id",
            "activity-stream-key",
            "/activity-stream/",
            "n2",
        ));
        let response = app
            .oneshot(hawk_request("/activity-stream/", &untrusted, "1.2.3.4, 10.0.0.9, 10.0.0.6"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_scope_enforcement() {
        let app = create_router(test_state(false));

        let wrong_scope = to_header_value(&hawk_header(
            "activity-stream-id",
            "activity-stream-key",
            "/datasets/",
            "n1",
        ));
        let response = app
            .clone()
            .oneshot(hawk_request("/datasets/", &wrong_scope, FORWARDED_FOR))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let wildcard = to_header_value(&hawk_header(
            "all-scopes-id",
            "all-scopes-key",
            "/datasets/",
            "n2",
        ));
        let response = app
            .oneshot(hawk_request("/datasets/", &wildcard, FORWARDED_FOR))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SERVER_AUTHORIZATION_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_hawk_route_exempt_from_signature_gate() {
        // No X-Signature, yet the Hawk route is reachable.
        let authorization = to_header_value(&hawk_header(
            "all-scopes-id",
            "all-scopes-key",
            "/activity-stream/",
            "n3",
        ));
        let response = create_router(test_state(false))
            .oneshot(hawk_request("/activity-stream/", &authorization, FORWARDED_FOR))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeated_forwarded_for_lines_are_one_list() {
        // The last line is appended by the platform; a caller-supplied first
        // line must not decide the client address.
        let authorization = to_header_value(&hawk_header(
            "activity-stream-id",
            "activity-stream-key",
            "/activity-stream/",
            "n4",
        ));
        let request = Request::builder()
            .uri("/activity-stream/")
            .header(header::HOST, HOST)
            .header(header::AUTHORIZATION, &authorization)
            .header("x-forwarded-for", FORWARDED_FOR)
            .header("x-forwarded-for", "9.9.9.9, 10.0.0.7")
            .body(Body::empty())
            .unwrap();

        let response = create_router(test_state(false)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["detail"],
            "Incorrect authentication credentials."
        );
    }

    #[tokio::test]
    async fn test_forwarded_for_split_across_lines_admitted() {
        let authorization = to_header_value(&hawk_header(
            "activity-stream-id",
            "activity-stream-key",
            "/activity-stream/",
            "n5",
        ));
        let request = Request::builder()
            .uri("/activity-stream/")
            .header(header::HOST, HOST)
            .header(header::AUTHORIZATION, &authorization)
            .header("x-forwarded-for", "1.2.3.4")
            .header("x-forwarded-for", "10.0.0.5, 10.0.0.6")
            .body(Body::empty())
            .unwrap();

        let response = create_router(test_state(false)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_undecodable_authorization_is_incorrect_not_missing() {
        let request = Request::builder()
            .uri("/activity-stream/")
            .header(header::HOST, HOST)
            .header(header::AUTHORIZATION, HeaderValue::from_bytes(b"Hawk id=\"\xff\"").unwrap())
            .header("x-forwarded-for", FORWARDED_FOR)
            .body(Body::empty())
            .unwrap();

        let response = create_router(test_state(false)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Hawk");
        assert_eq!(
            body_json(response).await["detail"],
            "Incorrect authentication credentials."
        );
    }

    #[test]
    fn test_route_auth_declarations() {
        assert!(!RouteAuth::signed().exempt);
        assert!(RouteAuth::exempt().hawk.is_none());

        let hawk = RouteAuth::hawk(Some(Scope::DataHub)).with_signed_response();
        assert!(hawk.exempt);
        assert_eq!(
            hawk.hawk,
            Some(HawkPolicy {
                required_scope: Some(Scope::DataHub),
                sign_response: true,
            })
        );

        // Response signing needs a Hawk principal.
        assert_eq!(RouteAuth::signed().with_signed_response(), RouteAuth::signed());
    }
}
