pub mod magic_link;
pub mod password;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
    domain::{
        entities::users::UserEntity,
        repositories::users::UserRepository,
        value_objects::{access::Principal, enums::roles::RoleSet},
    },
    infrastructure::axum_http::error_responses::error_response,
};

pub const SESSION_COOKIE: &str = "session_token";

const SESSION_ISSUER: &str = "staybook";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

/// Mints and validates the bearer session tokens carried in the session cookie.
pub struct SessionTokens {
    secret: String,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionTokens {
    pub fn new(secret: String, ttl_days: i64, secure_cookie: bool) -> Self {
        Self {
            secret,
            ttl: Duration::days(ttl_days),
            secure_cookie,
        }
    }

    pub fn issue(&self, user: &UserEntity) -> Result<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .context("failed to compute session expiry")?;

        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            iss: SESSION_ISSUER.to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("failed to sign session token")
    }

    pub fn verify(&self, token: &str) -> Result<Principal> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);

        let claims = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("session token validation failed")?
        .claims;

        let user_id = Uuid::parse_str(&claims.sub).context("invalid user id in session token")?;

        Ok(Principal {
            user_id,
            email: claims.email,
            roles: RoleSet::from_strings(&claims.roles),
        })
    }

    /// HttpOnly, SameSite=Lax, scoped to `/`, living as long as the token.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }
}

/// Where extractors read a user's current roles. Roles baked into the session token are
/// only a hint; a role removed since the token was issued no longer applies.
#[derive(Clone)]
pub struct RoleDirectory(pub Arc<dyn UserRepository + Send + Sync>);

/// Authenticated caller. Rejects with 401 when no valid session is presented.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// Caller that may be anonymous. An invalid session counts as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Principal>);

pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        error_response(self.status, self.message)
    }
}

/// Bearer header first, then the session cookie.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

fn session_tokens(parts: &Parts) -> Result<Arc<SessionTokens>, AuthRejection> {
    parts
        .extensions
        .get::<Arc<SessionTokens>>()
        .cloned()
        .ok_or_else(|| {
            error!("auth: session token verifier missing from request extensions");
            unavailable()
        })
}

fn role_directory(parts: &Parts) -> Result<RoleDirectory, AuthRejection> {
    parts.extensions.get::<RoleDirectory>().cloned().ok_or_else(|| {
        error!("auth: role directory missing from request extensions");
        unavailable()
    })
}

fn unavailable() -> AuthRejection {
    AuthRejection {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Session verification unavailable",
    }
}

/// Verifies the presented session and refreshes its roles from the user store.
/// `Ok(None)` for a missing, invalid or expired session, or a user that no longer exists.
async fn current_principal(parts: &Parts) -> Result<Option<Principal>, AuthRejection> {
    let tokens = session_tokens(parts)?;
    let directory = role_directory(parts)?;

    let Some(token) = session_token(parts) else {
        return Ok(None);
    };

    let principal = match tokens.verify(&token) {
        Ok(principal) => principal,
        Err(err) => {
            debug!(error = %err, "auth: rejected session token");
            return Ok(None);
        }
    };

    let user = directory
        .0
        .find_by_id(principal.user_id)
        .await
        .map_err(|err| {
            error!(user_id = %principal.user_id, db_error = ?err, "auth: failed to load session user");
            unavailable()
        })?;

    let Some(user) = user else {
        warn!(user_id = %principal.user_id, "auth: session belongs to a missing user");
        return Ok(None);
    };

    Ok(Some(Principal {
        user_id: user.id,
        email: user.email,
        roles: RoleSet::from_strings(&user.roles),
    }))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let had_token = session_token(parts).is_some();

        match current_principal(parts).await? {
            Some(principal) => Ok(AuthUser(principal)),
            None if had_token => Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid or expired session",
            }),
            None => Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                message: "Authentication required",
            }),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(current_principal(parts).await?))
    }
}
