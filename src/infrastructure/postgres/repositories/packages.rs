use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::packages::{EditPackageEntity, InsertPackageEntity, PackageEntity},
        repositories::packages::PackageRepository,
        value_objects::enums::package_categories::PackageCategory,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::packages},
};

pub struct PackagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PackagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PackageRepository for PackagePostgres {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        category: Option<PackageCategory>,
        enabled_only: bool,
    ) -> Result<Vec<PackageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = packages::table
            .filter(packages::post_id.eq(post_id))
            .select(PackageEntity::as_select())
            .into_boxed();
        if let Some(category) = category {
            query = query.filter(packages::category.eq(category.to_string()));
        }
        if enabled_only {
            query = query.filter(packages::is_enabled.eq(true));
        }

        let results = query
            .order((packages::min_nights.asc(), packages::created_at.asc()))
            .load::<PackageEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, package_id: Uuid) -> Result<Option<PackageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let package = packages::table
            .filter(packages::id.eq(package_id))
            .select(PackageEntity::as_select())
            .first::<PackageEntity>(&mut conn)
            .optional()?;

        Ok(package)
    }

    async fn find_by_revenue_cat_id(
        &self,
        post_id: Uuid,
        revenue_cat_id: &str,
    ) -> Result<Option<PackageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let package = packages::table
            .filter(packages::post_id.eq(post_id))
            .filter(packages::revenue_cat_id.eq(revenue_cat_id))
            .select(PackageEntity::as_select())
            .first::<PackageEntity>(&mut conn)
            .optional()?;

        Ok(package)
    }

    async fn create(&self, insert_package_entity: InsertPackageEntity) -> Result<PackageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let package = insert_into(packages::table)
            .values(&insert_package_entity)
            .returning(PackageEntity::as_returning())
            .get_result::<PackageEntity>(&mut conn)?;

        Ok(package)
    }

    async fn update(
        &self,
        package_id: Uuid,
        edit_package_entity: EditPackageEntity,
    ) -> Result<PackageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let package = update(packages::table)
            .filter(packages::id.eq(package_id))
            .set(&edit_package_entity)
            .returning(PackageEntity::as_returning())
            .get_result::<PackageEntity>(&mut conn)?;

        Ok(package)
    }

    async fn delete(&self, post_id: Uuid, package_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(packages::table)
            .filter(packages::id.eq(package_id))
            .filter(packages::post_id.eq(post_id))
            .execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
