use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::posts::PostEntity,
    value_objects::{enums::post_statuses::PostStatus, packages::PackageSetting},
};

#[derive(Debug, Clone, Serialize)]
pub struct PostDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub status: PostStatus,
    pub base_rate: Option<f64>,
    pub package_settings: Vec<PackageSetting>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostEntity> for PostDto {
    fn from(value: PostEntity) -> Self {
        Self {
            id: value.id,
            slug: value.slug,
            title: value.title,
            description: value.description,
            owner_id: value.owner_id,
            status: value.status,
            base_rate: value.base_rate,
            package_settings: value.package_settings,
            updated_at: value.updated_at,
        }
    }
}
