use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::packages::{EditPackageEntity, InsertPackageEntity, PackageEntity},
    value_objects::enums::{entitlement_tiers::EntitlementTier, package_categories::PackageCategory},
};

/// Per-property override of a package, keyed by package identity
/// (local package id or external product id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackageSetting {
    pub package_key: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageDto {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub multiplier: f64,
    pub category: PackageCategory,
    pub min_nights: i32,
    pub max_nights: Option<i32>,
    pub entitlement_required: EntitlementTier,
    pub is_enabled: bool,
    pub revenue_cat_id: Option<String>,
    pub base_rate: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl From<PackageEntity> for PackageDto {
    fn from(value: PackageEntity) -> Self {
        Self {
            category: value.category(),
            entitlement_required: value.entitlement(),
            id: value.id,
            post_id: value.post_id,
            name: value.name,
            description: value.description,
            multiplier: value.multiplier,
            min_nights: value.min_nights,
            max_nights: value.max_nights,
            is_enabled: value.is_enabled,
            revenue_cat_id: value.revenue_cat_id,
            base_rate: value.base_rate,
            updated_at: value.updated_at,
        }
    }
}

/// Query string of the package listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PackageListQuery {
    #[serde(default)]
    pub category: Option<PackageCategory>,
    #[serde(default)]
    pub nights: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackageModel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub category: PackageCategory,
    #[serde(default = "default_min_nights")]
    pub min_nights: i32,
    #[serde(default)]
    pub max_nights: Option<i32>,
    #[serde(default)]
    pub entitlement_required: EntitlementTier,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub revenue_cat_id: Option<String>,
    #[serde(default)]
    pub base_rate: Option<f64>,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_min_nights() -> i32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl CreatePackageModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        validate_bounds(Some(self.multiplier), Some(self.min_nights), self.max_nights)
    }

    pub fn to_entity(&self, post_id: Uuid) -> InsertPackageEntity {
        InsertPackageEntity {
            post_id,
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            multiplier: self.multiplier,
            category: self.category.to_string(),
            min_nights: self.min_nights,
            max_nights: self.max_nights,
            entitlement_required: self.entitlement_required.to_string(),
            is_enabled: self.is_enabled,
            revenue_cat_id: self.revenue_cat_id.clone(),
            base_rate: self.base_rate,
        }
    }
}

/// Absent fields stay untouched. For the nullable columns an explicit `null` clears the
/// value, so these are `Some(None)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePackageModel {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub multiplier: Option<f64>,
    pub category: Option<PackageCategory>,
    pub min_nights: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub max_nights: Option<Option<i32>>,
    pub entitlement_required: Option<EntitlementTier>,
    pub is_enabled: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub base_rate: Option<Option<f64>>,
}

/// Marks a field that appeared in the payload, `null` included.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdatePackageModel {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err("name must not be empty".to_string());
        }
        validate_bounds(self.multiplier, self.min_nights, self.max_nights.flatten())
    }

    pub fn to_entity(&self) -> EditPackageEntity {
        EditPackageEntity {
            name: self.name.as_ref().map(|name| name.trim().to_string()),
            description: self.description.clone(),
            multiplier: self.multiplier,
            category: self.category.map(|category| category.to_string()),
            min_nights: self.min_nights,
            max_nights: self.max_nights,
            entitlement_required: self.entitlement_required.map(|tier| tier.to_string()),
            is_enabled: self.is_enabled,
            base_rate: self.base_rate,
            updated_at: Some(Utc::now()),
        }
    }
}

fn validate_bounds(
    multiplier: Option<f64>,
    min_nights: Option<i32>,
    max_nights: Option<i32>,
) -> Result<(), String> {
    if let Some(multiplier) = multiplier {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err("multiplier must be a positive number".to_string());
        }
    }
    if let Some(min_nights) = min_nights {
        if min_nights < 1 {
            return Err("min_nights must be at least 1".to_string());
        }
    }
    if let (Some(min_nights), Some(max_nights)) = (min_nights, max_nights) {
        if max_nights < min_nights {
            return Err("max_nights must not be lower than min_nights".to_string());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSettingsModel {
    pub settings: Vec<PackageSetting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeletePackagesModel {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailedDeletion {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BulkDeleteOutcome {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<FailedDeletion>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub created: usize,
    pub updated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_settings_use_camel_case_json() {
        let settings: Vec<PackageSetting> = serde_json::from_value(serde_json::json!([
            { "packageKey": "weekly_pro", "customName": "Week away", "enabled": true },
            { "packageKey": "nightly" }
        ]))
        .unwrap();

        assert_eq!(settings[0].custom_name.as_deref(), Some("Week away"));
        assert_eq!(settings[1].enabled, None);
    }

    #[test]
    fn create_model_rejects_inverted_night_bounds() {
        let model: CreatePackageModel = serde_json::from_value(serde_json::json!({
            "name": "Long stay",
            "min_nights": 7,
            "max_nights": 3
        }))
        .unwrap();

        assert!(model.validate().is_err());
    }

    #[test]
    fn create_model_defaults() {
        let model: CreatePackageModel =
            serde_json::from_value(serde_json::json!({ "name": " Nightly " })).unwrap();

        assert!(model.validate().is_ok());
        let entity = model.to_entity(Uuid::nil());
        assert_eq!(entity.name, "Nightly");
        assert_eq!(entity.multiplier, 1.0);
        assert_eq!(entity.min_nights, 1);
        assert!(entity.is_enabled);
        assert_eq!(entity.category, "standard");
        assert_eq!(entity.entitlement_required, "none");
    }

    #[test]
    fn update_model_rejects_non_positive_multiplier() {
        let model = UpdatePackageModel {
            multiplier: Some(0.0),
            ..Default::default()
        };

        assert!(model.validate().is_err());
    }

    #[test]
    fn update_model_tells_null_from_absent() {
        let cleared: UpdatePackageModel =
            serde_json::from_value(serde_json::json!({ "max_nights": null })).unwrap();
        let untouched: UpdatePackageModel =
            serde_json::from_value(serde_json::json!({ "name": "Nightly" })).unwrap();
        let bounded: UpdatePackageModel =
            serde_json::from_value(serde_json::json!({ "max_nights": 14 })).unwrap();

        assert_eq!(cleared.to_entity().max_nights, Some(None));
        assert_eq!(untouched.to_entity().max_nights, None);
        assert_eq!(bounded.to_entity().max_nights, Some(Some(14)));
        assert_eq!(untouched.to_entity().base_rate, None);
    }
}
