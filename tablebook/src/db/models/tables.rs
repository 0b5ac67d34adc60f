//! Database models for restaurant tables.

use crate::types::TableId;

/// Database request for creating a table (used when seeding)
#[derive(Debug, Clone)]
pub struct TableCreateDBRequest {
    pub seats: i32,
}

/// Database response for a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDBResponse {
    pub id: TableId,
    pub seats: i32,
}
