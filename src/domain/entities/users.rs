use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        entitlement_tiers::EntitlementTier, roles::RoleSet,
        subscription_statuses::SubscriptionStatus,
    },
    infrastructure::postgres::schema::users,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub subscription_status: String,
    pub plan_tier: String,
    pub host_profile: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    pub fn role_set(&self) -> RoleSet {
        RoleSet::from_strings(&self.roles)
    }

    pub fn subscription(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.subscription_status)
    }

    pub fn tier(&self) -> EntitlementTier {
        EntitlementTier::from_str(&self.plan_tier)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct InsertUserEntity {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub subscription_status: String,
    pub plan_tier: String,
}
