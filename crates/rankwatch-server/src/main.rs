use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use rankwatch_api::auth::{self, AppState, AppStateInner};
use rankwatch_api::middleware::require_auth;
use rankwatch_api::service::{AuthService, TrackedUrlService};
use rankwatch_api::tracked_urls;
use rankwatch_ranking::DataForSeoClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rankwatch=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("RANKWATCH_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("RANKWATCH_DB_PATH").unwrap_or_else(|_| "rankwatch.db".into());
    let host = std::env::var("RANKWATCH_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RANKWATCH_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Arc::new(rankwatch_db::Database::open(&PathBuf::from(&db_path))?);

    // Ranking provider. Without credentials the server still runs;
    // lookups fail per call and records are created without a rank.
    let ranking = Arc::new(DataForSeoClient::from_env());
    if !ranking.has_credentials() {
        warn!("DATAFORSEO_LOGIN / DATAFORSEO_PASSWORD not set; rank lookups will be skipped");
    }

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        auth: AuthService::new(db.clone(), jwt_secret.clone()),
        tracked_urls: TrackedUrlService::new(db, ranking),
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/tracked-urls", post(tracked_urls::create_tracked_url))
        .route("/tracked-urls", get(tracked_urls::list_tracked_urls))
        .route("/tracked-urls/{id}", delete(tracked_urls::delete_tracked_url))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("rankwatch server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
