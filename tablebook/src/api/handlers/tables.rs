//! HTTP handlers for restaurant tables.

use axum::{extract::State, response::Json};
use tracing::instrument;

use crate::{
    AppState,
    api::models::tables::TableResponse,
    db::{Backend, Gateway},
    engine::Engine,
    errors::{ErrorResponse, Result},
};

#[utoipa::path(
    get,
    path = "/tables",
    tag = "tables",
    summary = "List tables",
    responses(
        (status = 200, description = "All tables ordered by ID", body = [TableResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn list_tables<B: Backend>(State(state): State<AppState<B>>) -> Result<Json<Vec<TableResponse>>> {
    let mut gateway = state.backend.begin().await?;
    let tables = Engine::new(&mut gateway, &state.rules).list_tables().await?;
    gateway.commit().await?;

    Ok(Json(tables.into_iter().map(Into::into).collect()))
}
