use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        bookings::Guest,
        enums::{estimate_statuses::EstimateStatus, payment_statuses::PaymentStatus},
    },
    infrastructure::postgres::schema::estimates,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EstimateEntity {
    pub id: Uuid,
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub guests: Vec<Guest>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub total: Option<f64>,
    pub package_type: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: EstimateStatus,
    pub checkout_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EstimateEntity {
    /// Stored totals that are missing, zero or NaN need recomputing.
    pub fn has_usable_total(&self) -> bool {
        matches!(self.total, Some(total) if total.is_finite() && total > 0.0)
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = estimates)]
pub struct EstimateRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub guests: serde_json::Value,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub total: Option<f64>,
    pub package_type: Option<String>,
    pub payment_status: String,
    pub status: String,
    pub checkout_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EstimateRow> for EstimateEntity {
    fn from(value: EstimateRow) -> Self {
        Self {
            id: value.id,
            post_id: value.post_id,
            customer_id: value.customer_id,
            guests: serde_json::from_value(value.guests).unwrap_or_default(),
            from_date: value.from_date,
            to_date: value.to_date,
            total: value.total,
            package_type: value.package_type,
            payment_status: PaymentStatus::from_str(&value.payment_status),
            status: EstimateStatus::from_str(&value.status),
            checkout_id: value.checkout_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = estimates)]
pub struct InsertEstimateEntity {
    pub post_id: Uuid,
    pub customer_id: Uuid,
    pub guests: serde_json::Value,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub total: Option<f64>,
    pub package_type: Option<String>,
    pub payment_status: String,
    pub status: String,
}

/// Re-quote of an unpaid estimate.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = estimates)]
pub struct RequoteEstimateEntity {
    pub guests: serde_json::Value,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub total: Option<f64>,
    pub package_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}
