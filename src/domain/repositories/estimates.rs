use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::estimates::{
    EstimateEntity, InsertEstimateEntity, RequoteEstimateEntity,
};

#[automock]
#[async_trait]
pub trait EstimateRepository {
    async fn find_by_id(&self, estimate_id: Uuid) -> Result<Option<EstimateEntity>>;

    /// Estimate already settled with this checkout, if any.
    async fn find_by_checkout_id(&self, checkout_id: &str) -> Result<Option<EstimateEntity>>;

    /// Most recently updated estimate of a customer for a property.
    async fn find_latest(&self, customer_id: Uuid, post_id: Uuid)
    -> Result<Option<EstimateEntity>>;

    async fn create(&self, insert_estimate_entity: InsertEstimateEntity)
    -> Result<EstimateEntity>;

    async fn requote(
        &self,
        estimate_id: Uuid,
        requote_estimate_entity: RequoteEstimateEntity,
    ) -> Result<EstimateEntity>;

    async fn update_total(&self, estimate_id: Uuid, total: f64) -> Result<()>;

    async fn mark_paid(&self, estimate_id: Uuid, checkout_id: String) -> Result<EstimateEntity>;
}
