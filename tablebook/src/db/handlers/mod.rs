//! Repository implementations for PostgreSQL access.
//!
//! Each repository wraps a borrowed connection (usually the request's transaction), binds
//! parameters, and returns models from [`crate::db::models`]. Errors come back as
//! [`DbError`](crate::db::errors::DbError) so constraint violations can be told apart.
//!
//! ```ignore
//! use tablebook::db::handlers::Tables;
//!
//! let mut tx = pool.begin().await?;
//! let tables = Tables::new(&mut tx).list().await?;
//! tx.commit().await?;
//! ```

pub mod reservations;
pub mod tables;
pub mod users;

pub use reservations::Reservations;
pub use tables::Tables;
pub use users::Users;
