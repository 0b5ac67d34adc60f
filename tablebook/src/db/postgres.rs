//! PostgreSQL backend: each gateway owns one transaction from the pool.

use crate::db::{
    errors::Result,
    gateway::{Backend, Gateway},
    handlers::{Reservations, Tables, Users, reservations::ReservationFilter},
    models::{
        reservations::{ReservationCreateDBRequest, ReservationDBResponse, ReservationDetailsDBResponse, ReservationUpdateDBRequest},
        tables::TableDBResponse,
        users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use crate::types::{ReservationId, TableId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Clone, Debug)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Backend for PgBackend {
    type Gateway = PgGateway;

    async fn begin(&self) -> Result<PgGateway> {
        let tx = self.pool.begin().await?;
        Ok(PgGateway { tx })
    }
}

/// Rolls back on drop unless committed.
pub struct PgGateway {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl Gateway for PgGateway {
    async fn find_table(&mut self, id: TableId) -> Result<Option<TableDBResponse>> {
        Tables::new(&mut self.tx).get_by_id(id).await
    }

    async fn list_tables(&mut self) -> Result<Vec<TableDBResponse>> {
        Tables::new(&mut self.tx).list().await
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        Users::new(&mut self.tx).get_by_email(email).await
    }

    async fn create_user(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        Users::new(&mut self.tx).create(request).await
    }

    async fn upsert_user_by_email(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        Users::new(&mut self.tx).upsert_by_email(request).await
    }

    async fn update_user(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        Users::new(&mut self.tx).update(id, request).await
    }

    async fn find_reservation_by_table_and_time(&mut self, table_id: TableId, date_time: DateTime<Utc>) -> Result<Option<ReservationDBResponse>> {
        Reservations::new(&mut self.tx).get_by_table_and_time(table_id, date_time).await
    }

    async fn find_reservation_by_id(&mut self, id: ReservationId) -> Result<Option<ReservationDetailsDBResponse>> {
        Reservations::new(&mut self.tx).get_by_id(id).await
    }

    async fn list_reservations(&mut self, filter: &ReservationFilter) -> Result<(Vec<ReservationDetailsDBResponse>, i64)> {
        let mut repo = Reservations::new(&mut self.tx);
        let rows = repo.list(filter).await?;
        let total = repo.count(filter).await?;
        Ok((rows, total))
    }

    async fn create_reservation(&mut self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse> {
        Reservations::new(&mut self.tx).create(request).await
    }

    async fn update_reservation(&mut self, id: ReservationId, request: &ReservationUpdateDBRequest) -> Result<ReservationDBResponse> {
        Reservations::new(&mut self.tx).update(id, request).await
    }

    async fn delete_reservation(&mut self, id: ReservationId) -> Result<bool> {
        Reservations::new(&mut self.tx).delete(id).await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
