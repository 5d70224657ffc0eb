use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::interfaces::commerce::CommerceCatalog,
    domain::value_objects::{
        enums::{entitlement_tiers::EntitlementTier, product_periods::ProductPeriod},
        offers::ExternalProduct,
    },
};

/// RevenueCat REST v2 client for the product catalog and customer entitlements.
pub struct RevenueCatClient {
    http: reqwest::Client,
    api_key: String,
    project_id: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResp<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ProductItem {
    id: String,
    store_identifier: String,
    display_name: Option<String>,
    subscription: Option<ProductSubscription>,
}

#[derive(Debug, Deserialize)]
struct ProductSubscription {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntitlementItem {
    id: String,
    lookup_key: String,
    products: Option<ListResp<EntitlementProduct>>,
}

#[derive(Debug, Deserialize)]
struct EntitlementProduct {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ActiveEntitlementItem {
    entitlement_id: String,
}

impl RevenueCatClient {
    pub fn new(api_key: String, project_id: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            project_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "revenue_cat: api request failed"
        );

        anyhow::bail!("RevenueCat API request failed: {} (status {})", context, status);
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project_id, path)
    }

    async fn get_items<T>(&self, path: &str, context: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .get(self.project_url(path))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, context).await?;

        let parsed: ListResp<T> = resp.json().await?;
        Ok(parsed.items)
    }

    async fn list_entitlements(&self) -> Result<Vec<EntitlementItem>> {
        self.get_items("entitlements?expand=items.product&limit=100", "list entitlements")
            .await
    }

    async fn active_entitlement_ids(&self, app_user_id: Uuid) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(self.project_url(&format!(
                "customers/{}/active_entitlements",
                app_user_id
            )))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        // Customers only exist after their first purchase.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let resp = Self::ensure_success(resp, "list active entitlements").await?;
        let parsed: ListResp<ActiveEntitlementItem> = resp.json().await?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| item.entitlement_id)
            .collect())
    }
}

#[async_trait]
impl CommerceCatalog for RevenueCatClient {
    async fn list_products(&self) -> Result<Vec<ExternalProduct>> {
        let (products, entitlements) = tokio::join!(
            self.get_items::<ProductItem>("products?limit=100", "list products"),
            self.list_entitlements(),
        );

        let products = map_products(products?, &entitlements?);
        info!(count = products.len(), "revenue_cat: products fetched");

        Ok(products)
    }

    async fn customer_entitlement(&self, app_user_id: Uuid) -> Result<EntitlementTier> {
        let (active, entitlements) = tokio::join!(
            self.active_entitlement_ids(app_user_id),
            self.list_entitlements(),
        );

        Ok(highest_tier(&active?, &entitlements?))
    }
}

/// ISO 8601 duration such as `P1W` or `P3M` into a period and count.
fn parse_duration(value: &str) -> Option<(ProductPeriod, i32)> {
    let rest = value.trim().strip_prefix('P')?;
    let rest = match rest.strip_prefix('T') {
        Some(time) => {
            let count = time.strip_suffix('H')?.parse().ok()?;
            return Some((ProductPeriod::Hour, count));
        }
        None => rest,
    };

    let unit = rest.chars().last()?;
    let count = rest[..rest.len() - unit.len_utf8()].parse().ok()?;
    let period = ProductPeriod::parse(&unit.to_string())?;

    Some((period, count))
}

fn map_products(products: Vec<ProductItem>, entitlements: &[EntitlementItem]) -> Vec<ExternalProduct> {
    let mut tiers: HashMap<&str, EntitlementTier> = HashMap::new();
    for entitlement in entitlements {
        let tier = EntitlementTier::from_str(&entitlement.lookup_key);
        for product in entitlement.products.iter().flat_map(|list| &list.items) {
            let entry = tiers.entry(product.id.as_str()).or_default();
            *entry = (*entry).max(tier);
        }
    }

    products
        .into_iter()
        .map(|product| {
            let duration = product
                .subscription
                .as_ref()
                .and_then(|subscription| subscription.duration.as_deref())
                .and_then(parse_duration);

            ExternalProduct {
                entitlement: tiers.get(product.id.as_str()).copied().unwrap_or_default(),
                title: product
                    .display_name
                    .unwrap_or_else(|| product.store_identifier.clone()),
                id: product.store_identifier,
                description: None,
                price: None,
                period: duration.map(|(period, _)| period),
                period_count: duration.map(|(_, count)| count).unwrap_or(1),
                features: Vec::new(),
            }
        })
        .collect()
}

fn highest_tier(active_ids: &[String], entitlements: &[EntitlementItem]) -> EntitlementTier {
    entitlements
        .iter()
        .filter(|entitlement| active_ids.contains(&entitlement.id))
        .map(|entitlement| EntitlementTier::from_str(&entitlement.lookup_key))
        .max()
        .unwrap_or_default()
}
