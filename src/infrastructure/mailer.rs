use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::application::interfaces::mailer::{EmailMessage, Mailer};

/// Transactional email over a Resend-compatible `/emails` endpoint.
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    from: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
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
            "mailer: api request failed"
        );

        anyhow::bail!("Email API request failed: {} (status {})", context, status);
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let body = SendEmailBody {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "send email").await?;

        #[derive(Deserialize)]
        struct SendResp {
            id: Option<String>,
        }

        let parsed: SendResp = resp.json().await?;
        info!(email_id = ?parsed.id, subject = %message.subject, "mailer: email sent");

        Ok(())
    }
}
