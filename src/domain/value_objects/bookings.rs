use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{bookings::BookingEntity, estimates::EstimateEntity},
    value_objects::enums::{estimate_statuses::EstimateStatus, payment_statuses::PaymentStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub fn guests_to_json(guests: &[Guest]) -> serde_json::Value {
    serde_json::to_value(guests).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingModel {
    /// Slug, or the post id as a fallback.
    pub post: String,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(default)]
    pub guests: Vec<Guest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDto {
    pub id: Uuid,
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub estimate_id: Option<Uuid>,
    pub title: String,
    pub guests: Vec<Guest>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub nights: i64,
    pub payment_status: PaymentStatus,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEntity> for BookingDto {
    fn from(value: BookingEntity) -> Self {
        let nights = super::stays::StayRange::new(value.from_date, value.to_date)
            .map(|stay| stay.nights())
            .unwrap_or(0);

        Self {
            id: value.id,
            post_id: value.post_id,
            customer_id: value.customer_id,
            estimate_id: value.estimate_id,
            title: value.title,
            guests: value.guests,
            from_date: value.from_date,
            to_date: value.to_date,
            nights,
            payment_status: value.payment_status,
            token: value.token,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingsOverviewDto {
    pub upcoming: Vec<BookingDto>,
    pub past: Vec<BookingDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertEstimateModel {
    pub post_id: Uuid,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(default)]
    pub guests: Vec<Guest>,
    /// Offer key of the selected package.
    #[serde(default)]
    pub package_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmEstimateModel {
    pub checkout_id: String,
    #[serde(default)]
    pub payment_validated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimateDto {
    pub id: Uuid,
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub guests: Vec<Guest>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub nights: i64,
    pub total: Option<f64>,
    pub package_type: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: EstimateStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<EstimateEntity> for EstimateDto {
    fn from(value: EstimateEntity) -> Self {
        let nights = super::stays::StayRange::new(value.from_date, value.to_date)
            .map(|stay| stay.nights())
            .unwrap_or(0);

        Self {
            id: value.id,
            post_id: value.post_id,
            customer_id: value.customer_id,
            guests: value.guests,
            from_date: value.from_date,
            to_date: value.to_date,
            nights,
            total: value.total,
            package_type: value.package_type,
            payment_status: value.payment_status,
            status: value.status,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedEstimateDto {
    pub estimate: EstimateDto,
    pub booking: BookingDto,
}
