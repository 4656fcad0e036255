#![allow(dead_code)]

use axum::{
    extract::Json,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// HS256 token around `claims`; the gateway never checks the signature
pub fn mint(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-only-secret"),
    )
    .expect("token encoding")
}

pub fn valid_token(sub: &str, role: Option<&str>) -> String {
    let mut claims = json!({"sub": sub, "exp": now() + 3600});
    if let Some(role) = role {
        claims["role"] = json!(role);
    }
    mint(claims)
}

pub fn expired_token(sub: &str) -> String {
    mint(json!({"sub": sub, "exp": now() - 60}))
}

async fn stub_login(Json(body): Json<Value>) -> impl IntoResponse {
    let login = body["login"].as_str().unwrap_or_default().to_string();
    match login.as_str() {
        "ghost" => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Credenciais inválidas"})),
        ),
        // Token only; the profile has to come from /auth/me
        "lean" => (StatusCode::OK, Json(json!({"token": valid_token("lean", None)}))),
        _ => (
            StatusCode::OK,
            Json(json!({
                "token": valid_token(&login, Some("USER")),
                "user": {
                    "id": 42,
                    "nome": "Usuário de Teste",
                    "email": format!("{}@uni.br", login),
                    "login": login,
                    "tipo": "USER"
                }
            })),
        ),
    }
}

async fn stub_me(headers: HeaderMap) -> impl IntoResponse {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "missing token"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": "b7e0c1d2",
            "nome": "Lean User",
            "email": "lean@uni.br",
            "login": "lean",
            "role": "ADMINISTRADOR",
            "ativo": true
        })),
    )
}

async fn stub_register(Json(body): Json<Value>) -> impl IntoResponse {
    if body["login"] == "taken" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Dados inválidos",
                "errors": {"login": "Login já está em uso"}
            })),
        );
    }
    (StatusCode::OK, Json(json!({"id": 99, "message": "Usuário criado"})))
}

async fn stub_projects(headers: HeaderMap) -> impl IntoResponse {
    if headers.get(header::AUTHORIZATION).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "missing token"})));
    }
    (StatusCode::OK, Json(json!([{"id": 1, "titulo": "Mata Atlântica"}])))
}

// The backend no longer honours the token, whatever its exp says
async fn stub_revoked() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token inválido"})))
}

/// Starts a stand-in for the REST backend and returns its base URL
pub async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/auth/login", post(stub_login))
        .route("/auth/me", get(stub_me))
        .route("/auth/register", post(stub_register))
        .route("/projetos", get(stub_projects))
        .route("/revogado", get(stub_revoked).delete(stub_revoked));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}
