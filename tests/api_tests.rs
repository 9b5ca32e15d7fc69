use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use property_portal::{
    AppConfig, AppState, JwtCookieResolver, MockSessionResolver, SessionState, create_router,
    auth::{Claims, Identity},
    models::SessionUser,
};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

const TEST_USER_ID: Uuid = Uuid::from_u128(99);

fn app(sessions: SessionState) -> Router {
    // No exported dashboard in most tests; allowed pages simply 404 from ServeDir.
    app_with_dashboard(sessions, "does-not-exist")
}

fn app_with_dashboard(sessions: SessionState, dashboard_dir: &str) -> Router {
    let mut config = AppConfig::default();
    config.dashboard_dir = dashboard_dir.to_string();

    create_router(AppState { sessions, config })
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn signed_in() -> SessionState {
    Arc::new(MockSessionResolver::new_authenticated(Identity {
        id: TEST_USER_ID,
        email: Some("manager@example.co.th".to_string()),
        role: "authenticated".to_string(),
    }))
}

fn anonymous() -> SessionState {
    Arc::new(MockSessionResolver::new_anonymous())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check_skips_gate() {
    let resolver = MockSessionResolver::new_unavailable();
    let response = app(Arc::new(resolver.clone())).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app(anonymous()).oneshot(get("/health")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_health_check_answers_anonymous_request() {
    let response = app(anonymous()).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_openapi_document_without_session_redirects() {
    let response = app(anonymous())
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_swagger_ui_without_session_redirects() {
    for uri in ["/swagger-ui", "/swagger-ui/", "/swagger-ui/index.html"] {
        let response = app(anonymous()).oneshot(get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_openapi_document_with_session() {
    let response = app(signed_in())
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/api/me"].is_object());
}

#[tokio::test]
async fn test_me_without_session_redirects_to_login() {
    let response = app(anonymous()).oneshot(get("/api/me")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_me_returns_session_user() {
    let response = app(signed_in()).oneshot(get("/api/me")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let user: SessionUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.email.as_deref(), Some("manager@example.co.th"));
}

#[tokio::test]
async fn test_dashboard_page_without_session_redirects() {
    let response = app(anonymous()).oneshot(get("/dashboard")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_public_listing_reaches_dashboard_files() {
    let response = app(anonymous()).oneshot(get("/listings/123")).await.unwrap();

    // Allowed through the gate; the missing export directory answers 404.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn test_dashboard_pages_resolve_html_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.path().join("dashboard.html"), "<h1>dashboard</h1>").unwrap();
    let dashboard_dir = dir.path().to_str().unwrap();

    let response = app_with_dashboard(signed_in(), dashboard_dir)
        .oneshot(get("/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "<h1>home</h1>");

    // Client routes are exported as `<route>.html`.
    for uri in ["/dashboard", "/dashboard/", "/dashboard.html"] {
        let response = app_with_dashboard(signed_in(), dashboard_dir)
            .oneshot(get(uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_text(response).await, "<h1>dashboard</h1>", "{uri}");
    }

    let response = app_with_dashboard(signed_in(), dashboard_dir)
        .oneshot(get("/reports"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_html_still_gated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dashboard.html"), "<h1>dashboard</h1>").unwrap();

    let response = app_with_dashboard(anonymous(), dir.path().to_str().unwrap())
        .oneshot(get("/dashboard"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_static_asset_bypasses_resolver() {
    let resolver = MockSessionResolver::new_unavailable();
    let response = app(Arc::new(resolver.clone()))
        .oneshot(get("/_next/static/chunk.js"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .body(Body::empty())
        .unwrap();

    let response = app(signed_in()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("sb-access-token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_clear_wins_over_refresh() {
    // Token close to expiry: the resolver wants to refresh it on this very request.
    let config = AppConfig::default();
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: TEST_USER_ID,
        iat: now as usize,
        exp: (now + 30) as usize,
        aud: config.jwt_audience.clone(),
        email: None,
        role: "authenticated".to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .header(
            header::COOKIE,
            HeaderValue::from_str(&format!("sb-access-token={token}")).unwrap(),
        )
        .body(Body::empty())
        .unwrap();

    let response = app(Arc::new(JwtCookieResolver::from_config(&config)))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookies: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies.len(), 2);
    // Browsers apply Set-Cookie in order, so the clearing cookie must come last.
    assert!(cookies[1].contains("Max-Age=0"));
}
