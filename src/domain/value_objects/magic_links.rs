use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAGIC_LINK_PURPOSE: &str = "magic_link";
pub const MAGIC_CODE_PURPOSE: &str = "magic_code";

#[derive(Debug, Clone, Deserialize)]
pub struct MagicLinkRequestModel {
    pub email: String,
}

/// Returned to the client so the emailed code can be submitted together with this
/// credential. It does not open the emailed link.
#[derive(Debug, Clone, Serialize)]
pub struct MagicLinkIssuedDto {
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeModel {
    pub email: String,
    pub code: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyLinkQuery {
    pub token: String,
}
