use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::estimates::{
            EstimateEntity, EstimateRow, InsertEstimateEntity, RequoteEstimateEntity,
        },
        repositories::estimates::EstimateRepository,
        value_objects::enums::{
            estimate_statuses::EstimateStatus, payment_statuses::PaymentStatus,
        },
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::estimates},
};

pub struct EstimatePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EstimatePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EstimateRepository for EstimatePostgres {
    async fn find_by_id(&self, estimate_id: Uuid) -> Result<Option<EstimateEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = estimates::table
            .filter(estimates::id.eq(estimate_id))
            .select(EstimateRow::as_select())
            .first::<EstimateRow>(&mut conn)
            .optional()?;

        Ok(row.map(EstimateEntity::from))
    }

    async fn find_by_checkout_id(&self, checkout_id: &str) -> Result<Option<EstimateEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = estimates::table
            .filter(estimates::checkout_id.eq(checkout_id))
            .select(EstimateRow::as_select())
            .first::<EstimateRow>(&mut conn)
            .optional()?;

        Ok(row.map(EstimateEntity::from))
    }

    async fn find_latest(
        &self,
        customer_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<EstimateEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = estimates::table
            .filter(estimates::customer_id.eq(customer_id))
            .filter(estimates::post_id.eq(post_id))
            .order(estimates::updated_at.desc())
            .select(EstimateRow::as_select())
            .first::<EstimateRow>(&mut conn)
            .optional()?;

        Ok(row.map(EstimateEntity::from))
    }

    async fn create(
        &self,
        insert_estimate_entity: InsertEstimateEntity,
    ) -> Result<EstimateEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(estimates::table)
            .values(&insert_estimate_entity)
            .returning(EstimateRow::as_returning())
            .get_result::<EstimateRow>(&mut conn)?;

        Ok(row.into())
    }

    async fn requote(
        &self,
        estimate_id: Uuid,
        requote_estimate_entity: RequoteEstimateEntity,
    ) -> Result<EstimateEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(estimates::table)
            .filter(estimates::id.eq(estimate_id))
            .set(&requote_estimate_entity)
            .returning(EstimateRow::as_returning())
            .get_result::<EstimateRow>(&mut conn)?;

        Ok(row.into())
    }

    async fn update_total(&self, estimate_id: Uuid, total: f64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(estimates::table)
            .filter(estimates::id.eq(estimate_id))
            .set(estimates::total.eq(Some(total)))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_paid(&self, estimate_id: Uuid, checkout_id: String) -> Result<EstimateEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(estimates::table)
            .filter(estimates::id.eq(estimate_id))
            .set((
                estimates::payment_status.eq(PaymentStatus::Paid.to_string()),
                estimates::status.eq(EstimateStatus::Confirmed.to_string()),
                estimates::checkout_id.eq(Some(checkout_id)),
                estimates::updated_at.eq(Utc::now()),
            ))
            .returning(EstimateRow::as_returning())
            .get_result::<EstimateRow>(&mut conn)?;

        Ok(row.into())
    }
}
