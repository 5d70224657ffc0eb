use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::{BookingEntity, InsertBookingEntity};

#[automock]
#[async_trait]
pub trait BookingRepository {
    async fn create(&self, insert_booking_entity: InsertBookingEntity) -> Result<BookingEntity>;

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    async fn find_by_estimate_id(&self, estimate_id: Uuid) -> Result<Option<BookingEntity>>;

    /// Bookings with `from_date >= now`, soonest first. `None` lists every customer.
    async fn list_upcoming(
        &self,
        customer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>>;

    /// Bookings with `from_date < now`, most recent first. `None` lists every customer.
    async fn list_past(
        &self,
        customer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>>;
}
