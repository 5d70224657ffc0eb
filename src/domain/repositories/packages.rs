use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::packages::{EditPackageEntity, InsertPackageEntity, PackageEntity},
    value_objects::enums::package_categories::PackageCategory,
};

#[automock]
#[async_trait]
pub trait PackageRepository {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        category: Option<PackageCategory>,
        enabled_only: bool,
    ) -> Result<Vec<PackageEntity>>;

    async fn find_by_id(&self, package_id: Uuid) -> Result<Option<PackageEntity>>;

    async fn find_by_revenue_cat_id(
        &self,
        post_id: Uuid,
        revenue_cat_id: &str,
    ) -> Result<Option<PackageEntity>>;

    async fn create(&self, insert_package_entity: InsertPackageEntity) -> Result<PackageEntity>;

    async fn update(
        &self,
        package_id: Uuid,
        edit_package_entity: EditPackageEntity,
    ) -> Result<PackageEntity>;

    /// Returns `false` when no package with that id belongs to the post.
    async fn delete(&self, post_id: Uuid, package_id: Uuid) -> Result<bool>;
}
