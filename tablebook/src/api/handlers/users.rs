//! HTTP handlers for user endpoints.

use axum::{extract::State, response::Json};
use tracing::instrument;

use crate::{
    AppState,
    api::{
        extract::ValidatedJson,
        models::users::{CreateUserRequest, UserResponse},
    },
    db::{Backend, Gateway},
    engine::Engine,
    errors::{ErrorResponse, Result},
};

/// Register a user, optionally booking a first table for them.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Create a user. When `reservationTime` and `reservationTable` are given, a reservation with the default duration is booked in the same transaction.",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request, email taken, outside opening hours or slot taken", body = ErrorResponse),
        (status = 404, description = "Table not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn create_user<B: Backend>(
    State(state): State<AppState<B>>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<Json<UserResponse>> {
    let request = request.into_new_user()?;

    let mut gateway = state.backend.begin().await?;
    let user = Engine::new(&mut gateway, &state.rules).create_user(request).await?;
    gateway.commit().await?;

    Ok(Json(user.into()))
}
