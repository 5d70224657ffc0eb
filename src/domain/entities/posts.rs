use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{enums::post_statuses::PostStatus, packages::PackageSetting},
    infrastructure::postgres::schema::posts,
};

#[derive(Debug, Clone)]
pub struct PostEntity {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub status: PostStatus,
    pub base_rate: Option<f64>,
    pub package_settings: Vec<PackageSetting>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row used for Diesel queries. Package settings stay as JSON and are parsed on conversion.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = posts)]
pub struct PostRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub status: String,
    pub base_rate: Option<f64>,
    pub package_settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for PostEntity {
    fn from(value: PostRow) -> Self {
        let package_settings = serde_json::from_value(value.package_settings).unwrap_or_default();

        Self {
            id: value.id,
            slug: value.slug,
            title: value.title,
            description: value.description,
            owner_id: value.owner_id,
            status: PostStatus::from_str(&value.status),
            base_rate: value.base_rate,
            package_settings,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
