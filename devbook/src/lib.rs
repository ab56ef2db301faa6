//! # devbook
//!
//! A small social-network backend: user registration and login, posts with
//! like counters, and a follower graph, exposed as a JSON REST API.
//!
//! ## Architecture
//!
//! - **API Layer** ([`api`]): Axum handlers, request/response models and the route table
//! - **Auth Layer** ([`auth`]): signed credentials, the authentication gate, ownership checks and password rotation
//! - **Database Layer** ([`db`]): the [`db::store::Storage`] trait, PostgreSQL repositories and migrations
//!
//! Authentication is stateless: `POST /login` returns a signed credential,
//! which clients send back as `Authorization: Bearer <credential>`. Mutations
//! are only allowed on resources the caller owns.
//!
//! ## Getting Started
//!
//! ```ignore
//! use devbook::{Application, Config};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = devbook::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     devbook::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(std::future::pending()).await
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`]. The signing secret (`secret_key`) is required.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

#[cfg(test)]
mod test;

use crate::{
    api::{handlers::healthz, routes::build_api_router},
    auth::token::TokenCodec,
    db::store::{PgStorage, Storage},
};
use axum::{
    Router,
    http::{self, HeaderValue, Method},
    routing::get,
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};

pub use config::Config;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(Arc::new(PgStorage::new(pool)))
///     .config(config)
///     .tokens(Arc::new(tokens))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: Arc<dyn Storage>,
    pub config: Config,
    /// Loaded once at startup and never rotated while serving
    pub tokens: Arc<TokenCodec>,
}

/// Get the devbook database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the token codec from configuration.
pub fn create_token_codec(config: &Config) -> anyhow::Result<TokenCodec> {
    let secret_key = config
        .secret_key
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("secret_key is required to sign credentials"))?;

    Ok(TokenCodec::new(secret_key, config.auth.token_expiry))
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = cors_config
            .allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(healthz))
        .merge(build_api_router(&state))
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The HTTP server: router plus the resources it owns.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the database, run migrations and build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let tokens = create_token_codec(&config)?;

        info!("Connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(config.database.acquire_timeout)
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;
        info!("Database migrations applied");

        let state = AppState::builder()
            .db(Arc::new(PgStorage::new(pool.clone())))
            .config(config.clone())
            .tokens(Arc::new(tokens))
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("devbook listening on http://{}", bind_addr);

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
