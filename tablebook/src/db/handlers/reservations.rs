//! Database repository for reservations.

use crate::db::{
    errors::{DbError, Result},
    models::{
        reservations::{ReservationCreateDBRequest, ReservationDBResponse, ReservationDetailsDBResponse, ReservationUpdateDBRequest},
        tables::TableDBResponse,
        users::UserDBResponse,
    },
};
use crate::types::{ReservationId, TableId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing reservations
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub skip: i64,
    pub limit: i64,
    /// Inclusive lower bound on `date_time`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `date_time`
    pub end: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Whether an instant falls inside the (inclusive) date range of this filter.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant <= end)
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationDBResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            table_id: r.table_id,
            date_time: r.date_time,
            duration: r.duration,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// Row of the reservations/users/restaurant_tables join
#[derive(Debug, Clone, FromRow)]
struct ReservationWithRelations {
    pub id: ReservationId,
    pub user_id: UserId,
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub user_created_at: DateTime<Utc>,
    pub user_updated_at: DateTime<Utc>,
    pub table_seats: i32,
}

impl From<ReservationWithRelations> for ReservationDetailsDBResponse {
    fn from(row: ReservationWithRelations) -> Self {
        Self {
            user: UserDBResponse {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                created_at: row.user_created_at,
                updated_at: row.user_updated_at,
            },
            table: TableDBResponse {
                id: row.table_id,
                seats: row.table_seats,
            },
            reservation: ReservationDBResponse {
                id: row.id,
                user_id: row.user_id,
                table_id: row.table_id,
                date_time: row.date_time,
                duration: row.duration,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

const SELECT_WITH_RELATIONS: &str = r#"
    SELECT
        r.id, r.user_id, r.table_id, r.date_time, r.duration, r.created_at, r.updated_at,
        u.name AS user_name,
        u.email AS user_email,
        u.created_at AS user_created_at,
        u.updated_at AS user_updated_at,
        t.seats AS table_seats
    FROM reservations r
    JOIN users u ON u.id = r.user_id
    JOIN restaurant_tables t ON t.id = r.table_id
"#;

pub struct Reservations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reservations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(table_id = request.table_id, date_time = %request.date_time), err)]
    pub async fn create(&mut self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (user_id, table_id, date_time, duration)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.table_id)
        .bind(request.date_time)
        .bind(request.duration)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reservation.into())
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: ReservationId) -> Result<Option<ReservationDetailsDBResponse>> {
        let query = format!("{SELECT_WITH_RELATIONS} WHERE r.id = $1");
        let row = sqlx::query_as::<_, ReservationWithRelations>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Find the reservation holding exactly this slot on this table, if any.
    #[instrument(skip(self), err)]
    pub async fn get_by_table_and_time(&mut self, table_id: TableId, date_time: DateTime<Utc>) -> Result<Option<ReservationDBResponse>> {
        let reservation = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE table_id = $1 AND date_time = $2")
            .bind(table_id)
            .bind(date_time)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reservation.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &ReservationFilter) -> Result<Vec<ReservationDetailsDBResponse>> {
        let query = format!(
            r#"{SELECT_WITH_RELATIONS}
            WHERE ($1::timestamptz IS NULL OR r.date_time >= $1)
              AND ($2::timestamptz IS NULL OR r.date_time <= $2)
            ORDER BY r.date_time ASC, r.id ASC
            LIMIT $3 OFFSET $4"#
        );
        let rows = sqlx::query_as::<_, ReservationWithRelations>(&query)
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count reservations matching the filter's date range (ignores skip and limit).
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ReservationFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE ($1::timestamptz IS NULL OR date_time >= $1)
              AND ($2::timestamptz IS NULL OR date_time <= $2)
            "#,
        )
        .bind(filter.start)
        .bind(filter.end)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: ReservationId, request: &ReservationUpdateDBRequest) -> Result<ReservationDBResponse> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations SET
                table_id = $2,
                date_time = $3,
                duration = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.table_id)
        .bind(request.date_time)
        .bind(request.duration)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(reservation.into())
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: ReservationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
