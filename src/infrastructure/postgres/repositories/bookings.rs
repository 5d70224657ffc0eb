use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::bookings::{BookingEntity, BookingRow, InsertBookingEntity},
        repositories::bookings::BookingRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn create(&self, insert_booking_entity: InsertBookingEntity) -> Result<BookingEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(bookings::table)
            .values(&insert_booking_entity)
            .returning(BookingRow::as_returning())
            .get_result::<BookingRow>(&mut conn)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = bookings::table
            .filter(bookings::id.eq(booking_id))
            .select(BookingRow::as_select())
            .first::<BookingRow>(&mut conn)
            .optional()?;

        Ok(row.map(BookingEntity::from))
    }

    async fn find_by_estimate_id(&self, estimate_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = bookings::table
            .filter(bookings::estimate_id.eq(estimate_id))
            .select(BookingRow::as_select())
            .first::<BookingRow>(&mut conn)
            .optional()?;

        Ok(row.map(BookingEntity::from))
    }

    async fn list_upcoming(
        &self,
        customer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = bookings::table
            .filter(bookings::from_date.ge(now))
            .select(BookingRow::as_select())
            .into_boxed();
        if let Some(customer_id) = customer_id {
            query = query.filter(bookings::customer_id.eq(customer_id));
        }

        let rows = query
            .order(bookings::from_date.asc())
            .load::<BookingRow>(&mut conn)?;

        Ok(rows.into_iter().map(BookingEntity::from).collect())
    }

    async fn list_past(
        &self,
        customer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = bookings::table
            .filter(bookings::from_date.lt(now))
            .select(BookingRow::as_select())
            .into_boxed();
        if let Some(customer_id) = customer_id {
            query = query.filter(bookings::customer_id.eq(customer_id));
        }

        let rows = query
            .order(bookings::from_date.desc())
            .load::<BookingRow>(&mut conn)?;

        Ok(rows.into_iter().map(BookingEntity::from).collect())
    }
}
