mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use bioconnect::config::Config;
use bioconnect::routes::create_router;
use bioconnect::services::backend::BackendClient;

use common::{expired_token, valid_token};

fn app_with_backend(api_url: &str) -> Router {
    let config = Config {
        api_url: api_url.to_string(),
        ..Config::default()
    };
    create_router(&config, BackendClient::new(api_url))
}

fn app() -> Router {
    // Navigation never reaches the backend
    app_with_backend("http://127.0.0.1:9")
}

async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("bioconnect_token={}", token));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn anonymous_user_is_sent_to_login() {
    let response = get(app(), "/usuarios", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn user_role_cannot_open_admin_pages() {
    let token = valid_token("carol", Some("USER"));
    let response = get(app(), "/usuarios", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard?error=access_denied");

    let response = get(app(), "/dashboard?error=access_denied", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Access denied"));
}

#[tokio::test]
async fn admin_roles_open_admin_pages() {
    for token in [
        valid_token("master", None),
        valid_token("alice", Some("administrador")),
    ] {
        let response = get(app(), "/usuarios", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn expired_cookie_is_cleared() {
    let token = expired_token("bob");
    let response = get(app(), "/projetos/7", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    let cleared: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().any(|c| c.starts_with("bioconnect_token=;")));
    assert!(cleared.iter().any(|c| c.starts_with("bioconnect_user=;")));
}

#[tokio::test]
async fn signed_in_user_leaves_login_for_callback() {
    let token = valid_token("alice", None);
    let response = get(app(), "/login?callbackUrl=%2Fprojetos%2F3", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/projetos/3");

    let response = get(app(), "/login", Some(&token)).await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn unsafe_callbacks_land_on_dashboard() {
    let token = valid_token("alice", None);
    for uri in [
        "/login?callbackUrl=%2Fprojetos%0Aevil",
        "/login?callbackUrl=%2Fprojetos%0D%0ASet-Cookie%3A%20x%3D1",
        "/login?callbackUrl=%2F%5Cevil.example",
    ] {
        let response = get(app(), uri, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/dashboard");
    }
}

#[tokio::test]
async fn detail_views_keep_their_callback() {
    let response = get(app(), "/eventos/12", None).await;
    assert_eq!(location(&response), "/login?callbackUrl=%2Feventos%2F12");
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let token = valid_token("alice", None);
    let request = Request::builder()
        .uri("/dashboard")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_public() {
    let response = get(app(), "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn session_me_reports_claims() {
    let token = valid_token("Master", Some("USER"));
    let response = get(app(), "/api/session/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subject"], "Master");
    assert_eq!(body["role"], "ADMIN");

    let response = get(app(), "/api/session/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(app(), "/api/session/me", Some(&expired_token("bob"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_drops_both_cookies() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/session/logout")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
}

#[tokio::test]
async fn login_sets_mirror_cookie() {
    let api_url = common::spawn_backend().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/session/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"login": "master", "senha": "Segura123", "rememberMe": true}"#,
        ))
        .unwrap();
    let response = app_with_backend(&api_url).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("bioconnect_token="));
    assert!(cookie.contains("Expires=Fri, 31 Dec 9999 23:59:59 GMT"));

    let body = json_body(response).await;
    assert_eq!(body["user"]["tipo"], "ADMIN");
    assert_eq!(body["persistent"], true);
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    let api_url = common::spawn_backend().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/session/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"login": "ghost", "senha": "x"}"#))
        .unwrap();
    let response = app_with_backend(&api_url).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Credenciais inválidas"));
}

#[tokio::test]
async fn register_validates_before_calling_backend() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/session/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"login": "a", "senha": "fraca", "nome": "A", "email": "a@uni.br"}"#,
        ))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["login"].is_array());
    assert!(body["errors"]["senha"].is_array());
}
