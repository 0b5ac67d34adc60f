//! API response models for restaurant tables.

use crate::db::models::tables::TableDBResponse;
use crate::types::TableId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
    pub id: TableId,
    pub seats: i32,
}

impl From<TableDBResponse> for TableResponse {
    fn from(table: TableDBResponse) -> Self {
        Self {
            id: table.id,
            seats: table.seats,
        }
    }
}
