use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::posts::{PostEntity, PostRow},
        repositories::posts::PostRepository,
        value_objects::{enums::post_statuses::PostStatus, packages::PackageSetting},
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::posts},
};

pub struct PostPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PostPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PostRepository for PostPostgres {
    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<PostEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = posts::table
            .filter(posts::id.eq(post_id))
            .select(PostRow::as_select())
            .first::<PostRow>(&mut conn)
            .optional()?;

        Ok(row.map(PostEntity::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = posts::table
            .filter(posts::slug.eq(slug))
            .select(PostRow::as_select())
            .first::<PostRow>(&mut conn)
            .optional()?;

        Ok(row.map(PostEntity::from))
    }

    async fn list(&self, status: Option<PostStatus>) -> Result<Vec<PostEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = posts::table.select(PostRow::as_select()).into_boxed();
        if let Some(status) = status {
            query = query.filter(posts::status.eq(status.to_string()));
        }

        let rows = query
            .order(posts::created_at.desc())
            .load::<PostRow>(&mut conn)?;

        Ok(rows.into_iter().map(PostEntity::from).collect())
    }

    async fn update_package_settings(
        &self,
        post_id: Uuid,
        settings: Vec<PackageSetting>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let settings = serde_json::to_value(settings)?;

        update(posts::table)
            .filter(posts::id.eq(post_id))
            .set((
                posts::package_settings.eq(settings),
                posts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
