//! HTTP request handlers for all API endpoints.
//!
//! Each handler opens one gateway from the [`Backend`](crate::db::Backend) in the application
//! state, runs a single [`Engine`](crate::engine::Engine) operation, and commits only when that
//! operation succeeds. Handlers are generic over the backend so the same router serves PostgreSQL
//! and the in-memory store.
//!
//! - [`reservations`]: Reservation listing, lookup, creation, partial update and deletion
//! - [`users`]: User creation
//! - [`tables`]: Table listing

pub mod reservations;
pub mod tables;
pub mod users;
