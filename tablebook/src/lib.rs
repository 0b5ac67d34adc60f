//! # tablebook: reservations for a single restaurant
//!
//! `tablebook` is a small REST service that books restaurant tables. Clients create users,
//! list, create, edit and delete reservations, and the service enforces the house rules: a
//! reservation starts inside opening hours and ends before closing, and a table holds at most
//! one reservation per start time.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum). Handlers in [`api`]
//! validate the request shape, then open a [`db::Gateway`] (one database transaction) and run a
//! single [`engine::Engine`] operation on it. The engine owns every business rule; the gateway
//! only stores and fetches rows. The gateway is committed only when the engine succeeds, so a
//! rejected request never leaves a partial write behind.
//!
//! Storage is either PostgreSQL ([`db::PgBackend`], schema under `migrations/`) or a
//! process-local store ([`db::InMemoryBackend`]) selected by `database.type`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use tablebook::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = tablebook::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     tablebook::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    config::{CorsOrigin, DatabaseConfig, PoolSettings, SeedConfig},
    db::{
        Backend, InMemoryBackend, PgBackend,
        handlers::Tables,
        models::tables::TableCreateDBRequest,
    },
    engine::BookingRules,
    openapi::ApiDoc,
};
use axum::{
    Router, http,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Generic over the storage [`Backend`] so the same router serves PostgreSQL and the in-memory
/// store.
///
/// ```ignore
/// let state = AppState::builder()
///     .backend(InMemoryBackend::new())
///     .rules(Arc::new(BookingRules::from(&config)))
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState<B: Backend> {
    pub backend: B,
    pub config: Config,
    pub rules: Arc<BookingRules>,
}

/// Get the tablebook database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured number of tables if the database has none.
///
/// Runs in one transaction, so a failed seed leaves the table list empty and the next start
/// tries again.
#[instrument(skip_all, err)]
pub async fn seed_tables(pool: &PgPool, seed: &SeedConfig) -> anyhow::Result<()> {
    if !seed.enabled {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let mut tables = Tables::new(&mut tx);

    let existing = tables.count().await?;
    if existing > 0 {
        debug!("Skipping table seed, {} tables already exist", existing);
        return Ok(());
    }

    for _ in 0..seed.tables {
        tables.create(&TableCreateDBRequest { seats: seed.seats }).await?;
    }
    tx.commit().await?;

    info!("Seeded {} tables with {} seats each", seed.tables, seed.seats);
    Ok(())
}

/// In-memory counterpart of [`seed_tables`].
pub async fn seed_in_memory_tables(backend: &InMemoryBackend, seed: &SeedConfig) -> anyhow::Result<()> {
    if !seed.enabled || backend.table_count().await > 0 {
        return Ok(());
    }

    for _ in 0..seed.tables {
        backend.insert_table(seed.seats).await?;
    }

    info!("Seeded {} in-memory tables with {} seats each", seed.tables, seed.seats);
    Ok(())
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let optional_secs = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional_secs(settings.idle_timeout_secs))
        .max_lifetime(optional_secs(settings.max_lifetime_secs))
}

/// Connect, migrate and seed an external PostgreSQL database.
async fn setup_database(url: &str, settings: &PoolSettings, seed: &SeedConfig) -> anyhow::Result<PgPool> {
    info!("Using external database");
    let pool = pool_options(settings).connect(url).await?;
    migrator().run(&pool).await?;
    seed_tables(&pool, seed).await?;
    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.cors;

    let allow_origin = if cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Url serializes with a trailing slash; browsers send the bare origin
                origins.push(url.as_str().trim_end_matches('/').parse::<http::HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE]);

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(Duration::from_secs(max_age));
    }

    Ok(layer)
}

/// Build the application router: the reservation API, health check, OpenAPI document and docs
/// UI, wrapped in CORS and request tracing.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router<B: Backend>(state: AppState<B>) -> anyhow::Result<Router> {
    use api::handlers::{reservations, tables, users};

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route(
            "/reservations",
            get(reservations::list_reservations::<B>).post(reservations::create_reservation::<B>),
        )
        .route(
            "/reservations/{id}",
            get(reservations::get_reservation::<B>)
                .patch(reservations::update_reservation::<B>)
                .delete(reservations::delete_reservation::<B>),
        )
        .route("/users", post(users::create_user::<B>))
        .route("/tables", get(tables::list_tables::<B>))
        .with_state(state)
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with storage ready to serve.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting tablebook with configuration: {:#?}", config);

        let rules = Arc::new(BookingRules::from(&config));

        let (router, pool) = match &config.database {
            DatabaseConfig::External { url, pool } => {
                let pool = setup_database(url, pool, &config.seed).await?;
                let state = AppState::builder()
                    .backend(PgBackend::new(pool.clone()))
                    .config(config.clone())
                    .rules(rules)
                    .build();
                (build_router(state)?, Some(pool))
            }
            DatabaseConfig::Memory => {
                info!("Using in-memory storage: data will be lost on shutdown");
                let backend = InMemoryBackend::new();
                seed_in_memory_tables(&backend, &config.seed).await?;
                let state = AppState::builder()
                    .backend(backend)
                    .config(config.clone())
                    .rules(rules)
                    .build();
                (build_router(state)?, None)
            }
        };

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Tablebook listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
