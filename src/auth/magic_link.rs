use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::value_objects::magic_links::{MAGIC_CODE_PURPOSE, MAGIC_LINK_PURPOSE};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
pub struct MagicLinkClaims {
    pub email: String,
    pub purpose: String,
    /// Keyed hash of the emailed code; only present on the code credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_hash: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// The pair of credentials minted for one sign-in request.
#[derive(Debug, Clone)]
pub struct IssuedMagicLink {
    /// Goes into the emailed URL only.
    pub link_token: String,
    /// Handed back to the requester; useless without the emailed code.
    pub code_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and checks the short-lived credentials behind the link and the code.
pub struct MagicLinkSigner {
    secret: String,
    ttl: Duration,
}

impl MagicLinkSigner {
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, email: &str, code: &str) -> Result<IssuedMagicLink> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .context("failed to compute magic link expiry")?;

        let link_token = self.sign(&MagicLinkClaims {
            email: email.to_string(),
            purpose: MAGIC_LINK_PURPOSE.to_string(),
            code_hash: None,
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        })?;
        let code_token = self.sign(&MagicLinkClaims {
            email: email.to_string(),
            purpose: MAGIC_CODE_PURPOSE.to_string(),
            code_hash: Some(hex::encode(self.code_mac(email, code)?.finalize().into_bytes())),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        })?;

        Ok(IssuedMagicLink {
            link_token,
            code_token,
            expires_at,
        })
    }

    pub fn sign(&self, claims: &MagicLinkClaims) -> Result<String> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("failed to sign magic link token")
    }

    /// Email proven by an emailed link. `None` for a bad signature, an expired token or a
    /// code credential. The caller is not told which.
    pub fn verify_link(&self, token: &str) -> Option<String> {
        let claims = self.decode(token, MAGIC_LINK_PURPOSE)?;
        Some(claims.email)
    }

    /// Email proven by a code credential together with the matching email and code.
    pub fn verify_code(&self, token: &str, email: &str, code: &str) -> Option<String> {
        let claims = self.decode(token, MAGIC_CODE_PURPOSE)?;
        if claims.email != email {
            return None;
        }

        let expected = hex::decode(claims.code_hash?).ok()?;
        self.code_mac(email, code).ok()?.verify_slice(&expected).ok()?;

        Some(claims.email)
    }

    fn decode(&self, token: &str, purpose: &str) -> Option<MagicLinkClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<MagicLinkClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .ok()?
        .claims;

        (claims.purpose == purpose).then_some(claims)
    }

    fn code_mac(&self, email: &str, code: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .context("invalid magic link secret")?;
        mac.update(email.as_bytes());
        mac.update(b":");
        mac.update(code.as_bytes());
        Ok(mac)
    }
}
