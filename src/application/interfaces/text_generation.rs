use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

/// Single-shot prompt/response against a generative-text model. Output is untrusted.
#[automock]
#[async_trait]
pub trait TextGenerator {
    async fn complete(&self, prompt: String) -> Result<String>;
}
