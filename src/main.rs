use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use bioconnect::config::Config;
use bioconnect::models::*;
use bioconnect::routes;
use bioconnect::services::backend::BackendClient;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BioConnect Gateway",
        version = "1.0.0",
        description = "Session and access control in front of the BioConnect pages",
        license(name = "MIT"),
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::session::login,
        crate::routes::session::register,
        crate::routes::session::logout,
        crate::routes::session::current_session,
    ),
    components(schemas(
        HealthResponse,
        LoginRequest,
        RegisterRequest,
        RegisterResponse,
        SessionResponse,
        SessionInfo,
        MessageResponse,
        ErrorResponse,
        UserProfile,
        Role,
    )),
    tags(
        (name = "Session", description = "Login, logout and session inspection"),
        (name = "System", description = "Health check"),
    ),
    servers(
        (url = "http://localhost:3000", description = "Local gateway"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bioconnect=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let backend = BackendClient::new(config.api_url.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(routes::create_router(&config, backend))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid listen address {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("========================================");
    tracing::info!("  BioConnect Gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Backend API: {}", config.api_url);
    tracing::info!("----------------------------------------");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/health            - Health check");
    tracing::info!("  POST /api/session/login     - Open session");
    tracing::info!("  POST /api/session/register  - Register account");
    tracing::info!("  POST /api/session/logout    - Close session");
    tracing::info!("  GET  /api/session/me        - Current session claims");
    tracing::info!("  GET  /api-docs/openapi.json - OpenAPI document");
    tracing::info!("  *    everything else        - Guarded page shells");
    tracing::info!("----------------------------------------");
    if config.master_superuser {
        tracing::warn!("The 'master' login is treated as ADMIN (set BIOCONNECT_MASTER_SUPERUSER=false to disable)");
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
