use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{bookings::Guest, enums::payment_statuses::PaymentStatus},
    infrastructure::postgres::schema::bookings,
};

#[derive(Debug, Clone)]
pub struct BookingEntity {
    pub id: Uuid,
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub estimate_id: Option<Uuid>,
    pub guests: Vec<Guest>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub token: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub estimate_id: Option<Uuid>,
    pub guests: serde_json::Value,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub payment_status: String,
    pub token: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingRow> for BookingEntity {
    fn from(value: BookingRow) -> Self {
        Self {
            id: value.id,
            post_id: value.post_id,
            customer_id: value.customer_id,
            estimate_id: value.estimate_id,
            guests: serde_json::from_value(value.guests).unwrap_or_default(),
            from_date: value.from_date,
            to_date: value.to_date,
            payment_status: PaymentStatus::from_str(&value.payment_status),
            token: value.token,
            title: value.title,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub estimate_id: Option<Uuid>,
    pub guests: serde_json::Value,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub payment_status: String,
    pub token: String,
    pub title: String,
}
