use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::DateTime;

use crate::config::{keys, Config};
use crate::error::{AppError, Result};
use crate::middleware::edge_guard::EdgeRequest;
use crate::models::{
    LoginRequest, MessageResponse, RegisterRequest, RegisterResponse, SessionInfo,
    SessionResponse,
};
use crate::services::backend::BackendClient;
use crate::services::storage::SessionCookie;
use crate::services::token;
use crate::utils::validate_registration;

/// State for the session routes
#[derive(Clone)]
pub struct SessionState {
    pub backend: BackendClient,
    pub master_superuser: bool,
    pub secure_cookies: bool,
}

pub fn router(backend: BackendClient, config: &Config) -> Router {
    let state = SessionState {
        backend,
        master_superuser: config.master_superuser,
        secure_cookies: config.secure_cookies,
    };
    Router::new()
        .route("/api/session/login", post(login))
        .route("/api/session/register", post(register))
        .route("/api/session/logout", post(logout))
        .route("/api/session/me", get(current_session))
        .with_state(state)
}

/// Log in against the backend and set the session cookie
#[utoipa::path(
    post,
    path = "/api/session/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 502, description = "Backend unreachable"),
    ),
    tag = "Session"
)]
pub async fn login(
    State(state): State<SessionState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if request.login.trim().is_empty() || request.senha.is_empty() {
        return Err(AppError::BadRequest("Login and password are required".to_string()));
    }

    let (token, user) = state
        .backend
        .authenticate(&request, state.master_superuser)
        .await?;

    let cookie = SessionCookie::token(token.clone(), request.remember_me)
        .secure(state.secure_cookies)
        .header_value();

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(SessionResponse {
            token,
            user,
            persistent: request.remember_me,
        }),
    ))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/session/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = RegisterResponse),
        (status = 422, description = "Invalid login or weak password"),
    ),
    tag = "Session"
)]
pub async fn register(
    State(state): State<SessionState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    validate_registration(&request.login, &request.senha)?;
    let response = state.backend.register(&request).await?;
    tracing::info!(login = %request.login, "account registered");
    Ok(Json(response))
}

/// Drop the session cookies
#[utoipa::path(
    post,
    path = "/api/session/logout",
    responses(
        (status = 200, description = "Session closed", body = MessageResponse),
    ),
    tag = "Session"
)]
pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([
            (header::SET_COOKIE, SessionCookie::removal_header(keys::TOKEN)),
            (header::SET_COOKIE, SessionCookie::removal_header(keys::USER)),
        ]),
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
}

/// Claims of the presented credential
#[utoipa::path(
    get,
    path = "/api/session/me",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "No valid credential"),
    ),
    tag = "Session"
)]
pub async fn current_session(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Json<SessionInfo>> {
    let credential = EdgeRequest::from_parts("/api/session/me", None, &headers)
        .credential()
        .ok_or_else(|| AppError::Unauthorized("No credential presented".to_string()))?;

    let claims = token::decode_claims(&credential)
        .filter(|c| !c.is_expired_at(chrono::Utc::now()))
        .ok_or_else(|| AppError::Unauthorized("Credential expired or invalid".to_string()))?;

    Ok(Json(SessionInfo {
        role: claims.role_with(state.master_superuser),
        expires_at: claims
            .expires_at
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .map(|dt| dt.to_rfc3339()),
        subject: claims.subject,
    }))
}
