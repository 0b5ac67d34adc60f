//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │   Engine    │  (crate::engine - booking rules)
//! └──────┬──────┘
//!        │  Gateway trait
//!        ↓
//! ┌─────────────┐        ┌─────────────┐
//! │  PgGateway  │        │  InMemory   │
//! └──────┬──────┘        └─────────────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`gateway`]: The [`Gateway`] and [`Backend`] traits the engine is written against
//! - [`postgres`]: Production backend; one transaction per gateway
//! - [`in_memory`]: Backend for tests and local development
//! - [`handlers`]: PostgreSQL repositories
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types

pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod postgres;

pub use gateway::{Backend, Gateway};
pub use in_memory::InMemoryBackend;
pub use postgres::PgBackend;
