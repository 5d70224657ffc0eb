use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::posts::PostEntity,
    value_objects::{enums::post_statuses::PostStatus, packages::PackageSetting},
};

#[automock]
#[async_trait]
pub trait PostRepository {
    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<PostEntity>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostEntity>>;

    /// `None` lists every status.
    async fn list(&self, status: Option<PostStatus>) -> Result<Vec<PostEntity>>;

    async fn update_package_settings(
        &self,
        post_id: Uuid,
        settings: Vec<PackageSetting>,
    ) -> Result<()>;
}
