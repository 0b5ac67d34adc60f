//! Test utilities for HTTP-level testing against the in-memory backend.
use crate::{
    AppState, build_router,
    config::{Config, SeedConfig},
    db::InMemoryBackend,
    engine::BookingRules,
};
use axum_test::TestServer;
use std::sync::Arc;

pub fn create_test_config() -> Config {
    Config {
        // tables are inserted explicitly by each test
        seed: SeedConfig {
            enabled: false,
            ..SeedConfig::default()
        },
        ..Config::default()
    }
}

/// Serve the full router over an in-memory store holding `tables` four-seat tables (ids from 1).
///
/// The backend is returned so tests can inspect what was persisted.
pub async fn create_test_app(tables: usize) -> (TestServer, InMemoryBackend) {
    let backend = InMemoryBackend::new();
    for _ in 0..tables {
        backend.insert_table(4).await.expect("Failed to insert test table");
    }

    let config = create_test_config();
    let state = AppState::builder()
        .backend(backend.clone())
        .rules(Arc::new(BookingRules::from(&config)))
        .config(config)
        .build();

    let router = build_router(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, backend)
}
