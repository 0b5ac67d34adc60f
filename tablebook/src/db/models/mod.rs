//! Database record models matching table schemas.
//!
//! Repositories in [`crate::db::handlers`] (and the in-memory store) accept the `*DBRequest`
//! types and return the `*DBResponse` types defined here. They are kept separate from the API
//! models in [`crate::api::models`] so storage and wire formats can change independently.
//!
//! - [`users`]: Guests who own reservations, keyed by email
//! - [`tables`]: Restaurant tables and their seat counts
//! - [`reservations`]: Time-slot bookings of a table by a user

pub mod reservations;
pub mod tables;
pub mod users;
