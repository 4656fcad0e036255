use axum::{extract::State, routing::get, Json, Router};

use crate::models::HealthResponse;

#[derive(Clone)]
pub struct HealthState {
    pub api_url: String,
}

pub fn router(api_url: String) -> Router {
    let state = HealthState { api_url };
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

/// Gateway health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Gateway up", body = HealthResponse),
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_url: state.api_url,
    })
}
