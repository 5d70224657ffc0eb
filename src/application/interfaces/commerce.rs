use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::{
    enums::entitlement_tiers::EntitlementTier, offers::ExternalProduct,
};

/// Third-party subscription/commerce catalog.
#[automock]
#[async_trait]
pub trait CommerceCatalog {
    async fn list_products(&self) -> Result<Vec<ExternalProduct>>;

    /// Highest active entitlement of the customer identified by our user id.
    async fn customer_entitlement(&self, app_user_id: Uuid) -> Result<EntitlementTier>;
}
