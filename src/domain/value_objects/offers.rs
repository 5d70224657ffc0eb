use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::{
    entities::packages::PackageEntity,
    value_objects::{
        enums::{
            entitlement_tiers::EntitlementTier, package_categories::PackageCategory,
            product_periods::ProductPeriod,
        },
        packages::PackageSetting,
        stays::effective_base_rate,
    },
};

/// Product as listed by the external subscription/commerce catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalProduct {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub period: Option<ProductPeriod>,
    pub period_count: i32,
    pub entitlement: EntitlementTier,
    pub features: Vec<String>,
}

impl ExternalProduct {
    pub fn nights(&self) -> i32 {
        self.period
            .map(|period| period.nights(self.period_count))
            .unwrap_or(1)
    }

    /// Listed price spread over the nights the product covers.
    pub fn nightly_rate(&self) -> Option<f64> {
        self.price
            .filter(|price| price.is_finite() && *price > 0.0)
            .map(|price| price / f64::from(self.nights()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSource {
    Local,
    External,
}

/// Either source of a package before normalization.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Local(PackageEntity),
    External(ExternalProduct),
}

impl CatalogSource {
    /// Identity used to match per-property overrides.
    pub fn key(&self) -> String {
        match self {
            CatalogSource::Local(package) => package.id.to_string(),
            CatalogSource::External(product) => product.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogDefaults {
    /// Whether an external product without an override is offered. Off unless configured.
    pub external_enabled: bool,
}

/// Canonical package representation used for filtering and pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub key: String,
    pub source: OfferSource,
    pub name: String,
    pub description: Option<String>,
    pub multiplier: f64,
    pub category: PackageCategory,
    pub min_nights: i32,
    pub max_nights: Option<i32>,
    pub entitlement_required: EntitlementTier,
    pub revenue_cat_id: Option<String>,
    pub base_rate: Option<f64>,
    pub features: Vec<String>,
    pub enabled: bool,
}

impl Offer {
    pub fn covers_nights(&self, nights: i64) -> bool {
        nights >= i64::from(self.min_nights)
            && self.max_nights.is_none_or(|max| nights <= i64::from(max))
    }
}

pub fn normalize(
    source: CatalogSource,
    setting: Option<&PackageSetting>,
    defaults: &CatalogDefaults,
) -> Offer {
    let key = source.key();
    let custom_name = setting
        .and_then(|setting| setting.custom_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    let override_enabled = setting.and_then(|setting| setting.enabled);

    match source {
        CatalogSource::Local(package) => Offer {
            key,
            source: OfferSource::Local,
            name: custom_name.unwrap_or_else(|| package.name.clone()),
            description: package.description.clone(),
            multiplier: package.multiplier,
            category: package.category(),
            min_nights: package.min_nights,
            max_nights: package.max_nights,
            entitlement_required: package.entitlement(),
            revenue_cat_id: package.revenue_cat_id.clone(),
            base_rate: package.base_rate,
            features: Vec::new(),
            enabled: package.is_enabled && override_enabled.unwrap_or(true),
        },
        CatalogSource::External(product) => {
            let nights = product.nights();
            let base_rate = product.nightly_rate();

            Offer {
                key,
                source: OfferSource::External,
                name: custom_name.unwrap_or(product.title),
                description: product.description,
                multiplier: 1.0,
                category: PackageCategory::Standard,
                min_nights: nights,
                max_nights: None,
                entitlement_required: product.entitlement,
                revenue_cat_id: Some(product.id),
                base_rate,
                features: product.features,
                enabled: override_enabled.unwrap_or(defaults.external_enabled),
            }
        }
    }
}

/// Normalizes both catalogs and keeps the effectively enabled offers.
/// An external product already mirrored by a local package (same `revenue_cat_id`) is skipped.
pub fn merge_offers(
    local: Vec<PackageEntity>,
    external: Vec<ExternalProduct>,
    settings: &[PackageSetting],
    defaults: &CatalogDefaults,
) -> Vec<Offer> {
    let settings_by_key: HashMap<&str, &PackageSetting> = settings
        .iter()
        .map(|setting| (setting.package_key.as_str(), setting))
        .collect();

    let mirrored: HashSet<String> = local
        .iter()
        .filter_map(|package| package.revenue_cat_id.clone())
        .collect();

    local
        .into_iter()
        .map(CatalogSource::Local)
        .chain(
            external
                .into_iter()
                .filter(|product| !mirrored.contains(&product.id))
                .map(CatalogSource::External),
        )
        .map(|source| {
            let key = source.key();
            normalize(source, settings_by_key.get(key.as_str()).copied(), defaults)
        })
        .filter(|offer| offer.enabled)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OfferFilter {
    pub nights: Option<i64>,
    pub tier: EntitlementTier,
    pub category: Option<PackageCategory>,
}

pub fn visible_offers(offers: Vec<Offer>, filter: &OfferFilter) -> Vec<Offer> {
    offers
        .into_iter()
        .filter(|offer| offer.enabled)
        .filter(|offer| filter.category.is_none_or(|category| offer.category == category))
        .filter(|offer| filter.nights.is_none_or(|nights| offer.covers_nights(nights)))
        .filter(|offer| filter.tier.satisfies(offer.entitlement_required))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedOffer {
    #[serde(flatten)]
    pub offer: Offer,
    pub nightly_price: f64,
    pub nights: Option<i64>,
    pub total: Option<f64>,
}

pub fn price_offer(offer: Offer, post_base_rate: Option<f64>, nights: Option<i64>) -> PricedOffer {
    let base_rate = effective_base_rate(offer.base_rate.or(post_base_rate));
    let nightly_price = base_rate * offer.multiplier;
    let total = nights.map(|nights| base_rate * nights as f64 * offer.multiplier);

    PricedOffer {
        offer,
        nightly_price,
        nights,
        total,
    }
}
