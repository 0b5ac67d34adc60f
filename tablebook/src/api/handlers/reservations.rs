//! HTTP handlers for reservation endpoints.
//!
//! Each handler opens one gateway, runs a single [`Engine`] operation on it and commits only if
//! the operation succeeded.

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::instrument;

use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, ValidatedJson},
        models::reservations::{
            CreateReservationRequest, ListReservationsQuery, ReservationResponse, ReservationsResponse, UpdateReservationRequest,
        },
    },
    db::{Backend, Gateway},
    engine::Engine,
    errors::{ErrorResponse, Result},
    types::ReservationId,
};

/// List reservations, newest schedule last.
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    summary = "List reservations",
    description = "Page through reservations ordered by start time, optionally limited to a date range.",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Page of reservations", body = ReservationsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn list_reservations<B: Backend>(
    State(state): State<AppState<B>>,
    ApiQuery(query): ApiQuery<ListReservationsQuery>,
) -> Result<Json<ReservationsResponse>> {
    let mut gateway = state.backend.begin().await?;
    let page = Engine::new(&mut gateway, &state.rules).list_reservations(query.into()).await?;
    gateway.commit().await?;

    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Get reservation",
    params(
        ("id" = i32, Path, description = "Reservation ID"),
    ),
    responses(
        (status = 200, description = "Reservation with its user and table", body = ReservationResponse),
        (status = 400, description = "Invalid reservation ID", body = ErrorResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(reservation_id = id))]
pub async fn get_reservation<B: Backend>(
    State(state): State<AppState<B>>,
    ApiPath(id): ApiPath<ReservationId>,
) -> Result<Json<ReservationResponse>> {
    let mut gateway = state.backend.begin().await?;
    let reservation = Engine::new(&mut gateway, &state.rules).get_reservation(id).await?;
    gateway.commit().await?;

    Ok(Json(reservation.into()))
}

/// Book a table. The user is looked up by email and created on first booking.
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    summary = "Create reservation",
    description = "Book a table at a start time inside opening hours. Fails if the table is already booked at exactly that time.",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 400, description = "Invalid request, outside opening hours or slot taken", body = ErrorResponse),
        (status = 404, description = "Table not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn create_reservation<B: Backend>(
    State(state): State<AppState<B>>,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>)> {
    let request = request.into_new_reservation()?;

    let mut gateway = state.backend.begin().await?;
    let reservation = Engine::new(&mut gateway, &state.rules).create_reservation(request).await?;
    gateway.commit().await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// Change any subset of a reservation's fields.
#[utoipa::path(
    patch,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Update reservation",
    description = "Fields left out keep their values. Username and email changes update the owning user.",
    params(
        ("id" = i32, Path, description = "Reservation ID"),
    ),
    request_body = UpdateReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = ReservationResponse),
        (status = 400, description = "Invalid request, outside opening hours or slot taken", body = ErrorResponse),
        (status = 404, description = "Reservation or table not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(reservation_id = id))]
pub async fn update_reservation<B: Backend>(
    State(state): State<AppState<B>>,
    ApiPath(id): ApiPath<ReservationId>,
    ValidatedJson(request): ValidatedJson<UpdateReservationRequest>,
) -> Result<Json<ReservationResponse>> {
    let patch = request.into_patch()?;

    let mut gateway = state.backend.begin().await?;
    let reservation = Engine::new(&mut gateway, &state.rules).edit_reservation(id, patch).await?;
    gateway.commit().await?;

    Ok(Json(reservation.into()))
}

#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Delete reservation",
    params(
        ("id" = i32, Path, description = "Reservation ID"),
    ),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 400, description = "Invalid reservation ID", body = ErrorResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(reservation_id = id))]
pub async fn delete_reservation<B: Backend>(State(state): State<AppState<B>>, ApiPath(id): ApiPath<ReservationId>) -> Result<StatusCode> {
    let mut gateway = state.backend.begin().await?;
    Engine::new(&mut gateway, &state.rules).delete_reservation(id).await?;
    gateway.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
