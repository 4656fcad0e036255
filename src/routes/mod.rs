pub mod health;
pub mod pages;
pub mod session;

use axum::{middleware, Router};

use crate::config::Config;
use crate::middleware::edge_guard::{edge_guard, EdgeGuard};
use crate::services::backend::BackendClient;

/// API routes plus the guarded page shells
pub fn create_router(config: &Config, backend: BackendClient) -> Router {
    let guard = EdgeGuard::new(config.master_superuser);

    let pages = pages::router().layer(middleware::from_fn_with_state(guard, edge_guard));

    Router::new()
        .merge(health::router(config.api_url.clone()))
        .merge(session::router(backend, config))
        .merge(pages)
}
