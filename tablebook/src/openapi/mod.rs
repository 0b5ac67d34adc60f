//! OpenAPI documentation for the reservation API.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::errors::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tablebook API",
        description = "Reservations for a single restaurant: users, tables and time-slot bookings.

Reservations must start inside opening hours (UTC) and end before closing. A table holds at most one reservation per start time."
    ),
    paths(
        api::handlers::reservations::list_reservations,
        api::handlers::reservations::get_reservation,
        api::handlers::reservations::create_reservation,
        api::handlers::reservations::update_reservation,
        api::handlers::reservations::delete_reservation,
        api::handlers::users::create_user,
        api::handlers::tables::list_tables,
    ),
    components(
        schemas(
            ErrorResponse,
            api::models::pagination::PaginationMeta,
            api::models::reservations::CreateReservationRequest,
            api::models::reservations::UpdateReservationRequest,
            api::models::reservations::ReservationResponse,
            api::models::reservations::ReservationsResponse,
            api::models::users::CreateUserRequest,
            api::models::users::UserResponse,
            api::models::tables::TableResponse,
        )
    ),
    tags(
        (name = "reservations", description = "Book, move and cancel table reservations.

A booking names its guest by email; unknown emails create a user on the fly."),
        (name = "users", description = "Register guests, optionally with a first reservation."),
        (name = "tables", description = "The restaurant's tables."),
    )
)]
pub struct ApiDoc;
