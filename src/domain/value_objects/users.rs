use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::users::UserEntity,
    value_objects::enums::{
        entitlement_tiers::EntitlementTier,
        roles::{Role, RoleSet},
        subscription_statuses::SubscriptionStatus,
    },
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HostProfile {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub payout_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub roles: RoleSet,
    pub subscription_status: SubscriptionStatus,
    pub plan_tier: EntitlementTier,
    pub host_profile: Option<HostProfile>,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for UserDto {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            roles: value.role_set(),
            subscription_status: value.subscription(),
            plan_tier: value.tier(),
            host_profile: value
                .host_profile
                .and_then(|profile| serde_json::from_value(profile).ok()),
            email: value.email,
            name: value.name,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserModel {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginModel {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpgradeModel {
    pub role: Role,
    #[serde(default)]
    pub host_profile: Option<HostProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRolesModel {
    pub roles: Vec<Role>,
}

/// Trims and lower-cases an address; rejects anything that is not `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_ascii_lowercase();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return None;
    }

    Some(email)
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}
