//! Database repository for restaurant tables.

use crate::db::{
    errors::Result,
    models::tables::{TableCreateDBRequest, TableDBResponse},
};
use crate::types::TableId;
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct RestaurantTable {
    pub id: TableId,
    pub seats: i32,
}

impl From<RestaurantTable> for TableDBResponse {
    fn from(table: RestaurantTable) -> Self {
        Self {
            id: table.id,
            seats: table.seats,
        }
    }
}

pub struct Tables<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Tables<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(seats = request.seats), err)]
    pub async fn create(&mut self, request: &TableCreateDBRequest) -> Result<TableDBResponse> {
        let table = sqlx::query_as::<_, RestaurantTable>("INSERT INTO restaurant_tables (seats) VALUES ($1) RETURNING *")
            .bind(request.seats)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(table.into())
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: TableId) -> Result<Option<TableDBResponse>> {
        let table = sqlx::query_as::<_, RestaurantTable>("SELECT * FROM restaurant_tables WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(table.map(Into::into))
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<TableDBResponse>> {
        let tables = sqlx::query_as::<_, RestaurantTable>("SELECT * FROM restaurant_tables ORDER BY id ASC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(tables.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM restaurant_tables")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
