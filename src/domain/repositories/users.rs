use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::users::{InsertUserEntity, UserEntity},
    value_objects::enums::{
        entitlement_tiers::EntitlementTier, subscription_statuses::SubscriptionStatus,
    },
};

#[automock]
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;

    async fn create(&self, insert_user_entity: InsertUserEntity) -> Result<UserEntity>;

    async fn update_password_hash(&self, user_id: Uuid, password_hash: String) -> Result<()>;

    async fn update_roles(&self, user_id: Uuid, roles: Vec<String>) -> Result<UserEntity>;

    async fn update_host_profile(
        &self,
        user_id: Uuid,
        host_profile: serde_json::Value,
    ) -> Result<()>;

    async fn update_subscription(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
        tier: EntitlementTier,
    ) -> Result<()>;
}
