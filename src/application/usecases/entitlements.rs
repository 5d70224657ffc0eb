use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    application::interfaces::commerce::CommerceCatalog,
    domain::{
        repositories::users::UserRepository,
        value_objects::enums::entitlement_tiers::EntitlementTier,
    },
};

/// Resolves the entitlement tier a user currently holds: the commerce catalog is asked first,
/// the subscription stored on the user is the fallback when the catalog is unreachable.
pub struct EntitlementResolver<U, C>
where
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    commerce: Arc<C>,
}

impl<U, C> EntitlementResolver<U, C>
where
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, commerce: Arc<C>) -> Self {
        Self {
            user_repo,
            commerce,
        }
    }

    pub async fn resolve_for_user(&self, user_id: Uuid) -> Result<EntitlementTier> {
        match self.commerce.customer_entitlement(user_id).await {
            Ok(tier) => {
                debug!(%user_id, %tier, "entitlements: using commerce entitlement");
                return Ok(tier);
            }
            Err(err) => {
                warn!(
                    %user_id,
                    error = ?err,
                    "entitlements: commerce lookup failed, using stored subscription"
                );
            }
        }

        let tier = match self.user_repo.find_by_id(user_id).await? {
            Some(user) if user.subscription().grants_access() => user.tier(),
            _ => EntitlementTier::None,
        };

        debug!(%user_id, %tier, "entitlements: using stored subscription tier");
        Ok(tier)
    }
}
