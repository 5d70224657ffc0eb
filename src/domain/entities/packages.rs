use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        entitlement_tiers::EntitlementTier, package_categories::PackageCategory,
    },
    infrastructure::postgres::schema::packages,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = packages)]
pub struct PackageEntity {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub multiplier: f64,
    pub category: String,
    pub min_nights: i32,
    pub max_nights: Option<i32>,
    pub entitlement_required: String,
    pub is_enabled: bool,
    pub revenue_cat_id: Option<String>,
    pub base_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PackageEntity {
    pub fn category(&self) -> PackageCategory {
        PackageCategory::from_str(&self.category)
    }

    pub fn entitlement(&self) -> EntitlementTier {
        EntitlementTier::from_str(&self.entitlement_required)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = packages)]
pub struct InsertPackageEntity {
    pub post_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub multiplier: f64,
    pub category: String,
    pub min_nights: i32,
    pub max_nights: Option<i32>,
    pub entitlement_required: String,
    pub is_enabled: bool,
    pub revenue_cat_id: Option<String>,
    pub base_rate: Option<f64>,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = packages)]
pub struct EditPackageEntity {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub multiplier: Option<f64>,
    pub category: Option<String>,
    pub min_nights: Option<i32>,
    pub max_nights: Option<Option<i32>>,
    pub entitlement_required: Option<String>,
    pub is_enabled: Option<bool>,
    pub base_rate: Option<Option<f64>>,
    pub updated_at: Option<DateTime<Utc>>,
}
