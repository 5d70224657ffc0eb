use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutState {
    pub paid: bool,
    pub status: String,
    /// Charged amount in the currency's minor unit.
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    /// Estimate the checkout was opened for, taken from its metadata.
    pub estimate_id: Option<String>,
}

/// Server-side lookup of a checkout at the payment provider.
#[automock]
#[async_trait]
pub trait PaymentVerifier {
    async fn checkout_state(&self, checkout_id: &str) -> Result<CheckoutState>;
}
