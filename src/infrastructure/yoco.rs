use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{error, info};

use crate::application::interfaces::payments::{CheckoutState, PaymentVerifier};

/// Read-only Yoco checkout client used to verify payments server-side.
pub struct YocoClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutResp {
    status: Option<String>,
    payment_id: Option<String>,
    amount: Option<i64>,
    currency: Option<String>,
    metadata: Option<CheckoutMetadata>,
}

/// Metadata attached when the checkout was opened.
#[derive(Debug, Deserialize)]
struct CheckoutMetadata {
    #[serde(rename = "estimateId", alias = "estimate_id")]
    estimate_id: Option<String>,
}

impl CheckoutResp {
    fn into_state(self) -> CheckoutState {
        let status = self
            .status
            .map(|status| status.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "unknown".to_string());
        let paid = matches!(status.as_str(), "completed" | "succeeded")
            || self.payment_id.is_some_and(|id| !id.trim().is_empty());

        CheckoutState {
            paid,
            status,
            amount_cents: self.amount,
            currency: self.currency.map(|currency| currency.trim().to_ascii_uppercase()),
            estimate_id: self
                .metadata
                .and_then(|metadata| metadata.estimate_id)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        }
    }
}

impl YocoClient {
    pub fn new(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
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
            "yoco: api request failed"
        );

        anyhow::bail!("Yoco API request failed: {} (status {})", context, status);
    }
}

#[async_trait]
impl PaymentVerifier for YocoClient {
    async fn checkout_state(&self, checkout_id: &str) -> Result<CheckoutState> {
        let mut url = url::Url::parse(&format!("{}/checkouts/", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Yoco base url cannot hold a path"))?
            .pop_if_empty()
            .push(checkout_id);

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get checkout").await?;

        let parsed: CheckoutResp = resp.json().await?;
        let state = parsed.into_state();
        info!(
            checkout_id,
            status = %state.status,
            paid = state.paid,
            amount_cents = ?state.amount_cents,
            "yoco: checkout fetched"
        );

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout(body: serde_json::Value) -> CheckoutState {
        serde_json::from_value::<CheckoutResp>(body).unwrap().into_state()
    }

    #[test]
    fn completed_checkout_is_paid() {
        let state = checkout(serde_json::json!({ "id": "ch_1", "status": "completed" }));

        assert!(state.paid);
        assert_eq!(state.status, "completed");
    }

    #[test]
    fn payment_id_marks_checkout_paid() {
        let state = checkout(serde_json::json!({ "status": "processing", "paymentId": "p_1" }));

        assert!(state.paid);
    }

    #[test]
    fn started_checkout_is_not_paid() {
        let state = checkout(serde_json::json!({ "status": "started", "paymentId": null }));

        assert!(!state.paid);
        assert_eq!(state.status, "started");
    }

    #[test]
    fn amount_currency_and_estimate_come_from_checkout() {
        let state = checkout(serde_json::json!({
            "id": "ch_1",
            "status": "completed",
            "amount": 45000,
            "currency": "zar",
            "metadata": { "estimateId": " 5b2f0c4e-0000-4000-8000-000000000001 " }
        }));

        assert_eq!(state.amount_cents, Some(45000));
        assert_eq!(state.currency.as_deref(), Some("ZAR"));
        assert_eq!(
            state.estimate_id.as_deref(),
            Some("5b2f0c4e-0000-4000-8000-000000000001")
        );
    }

    #[test]
    fn missing_status_is_unknown() {
        let state = checkout(serde_json::json!({ "metadata": null }));

        assert!(!state.paid);
        assert_eq!(state.status, "unknown");
        assert_eq!(state.estimate_id, None);
    }
}
