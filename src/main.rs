//! AuraLink Backend
//!
//! REST backend for AuraLink groups: profiles, group membership and the
//! group board of posts and comments, persisted in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod thread;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use thread::{GroupStore, IdentityProvider};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    /// Record store the board operations read and overwrite
    pub groups: Arc<dyn GroupStore>,
    /// Resolves `x-actor-id` to an actor
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed entirely by one SQLite repository.
    pub fn new(repo: Repository, config: Config) -> Self {
        let repo = Arc::new(repo);
        Self {
            groups: repo.clone(),
            identity: repo.clone(),
            repo,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AuraLink Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (AURALINK_API_PSK). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let bind_addr = config.bind_addr;
    let state = AppState::new(Repository::new(pool), config);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Profiles
        .route("/profiles", get(api::list_profiles).post(api::create_profile))
        .route("/profiles/{id}", get(api::get_profile))
        // Groups
        .route("/groups", get(api::list_groups).post(api::create_group))
        .route("/groups/{id}", get(api::get_group))
        .route("/groups/{id}/join", post(api::join_group))
        // Board
        .route("/groups/{id}/posts", post(api::create_post))
        .route("/groups/{id}/posts/{position}", delete(api::delete_post))
        .route(
            "/groups/{id}/posts/{position}/comments",
            post(api::add_comment),
        )
        .route(
            "/groups/{id}/posts/{position}/comments/{index}",
            delete(api::delete_comment),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
