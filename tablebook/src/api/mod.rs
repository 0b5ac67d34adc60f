//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: Extractors that turn malformed input into `400 { message }` responses
//!
//! # API Structure
//!
//! - **Reservations** (`/reservations`, `/reservations/{id}`): List, read, create, edit, delete
//! - **Users** (`/users`): Create a user, optionally with a first reservation
//! - **Tables** (`/tables`): Read-only list of restaurant tables
//!
//! All endpoints are documented with `utoipa`; the document is served at
//! `/api-docs/openapi.json` and rendered at `/docs`.

pub mod extract;
pub mod handlers;
pub mod models;
