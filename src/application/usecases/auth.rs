use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{
    application::{
        interfaces::mailer::{EmailMessage, Mailer},
        usecases::users::user_view,
    },
    auth::{
        SessionTokens,
        magic_link::MagicLinkSigner,
        password::{hash_password, random_code, random_password, verify_password},
    },
    domain::{
        entities::users::{InsertUserEntity, UserEntity},
        repositories::users::UserRepository,
        value_objects::{
            access::Principal,
            enums::{
                entitlement_tiers::EntitlementTier,
                roles::{Role, RoleSet},
                subscription_statuses::SubscriptionStatus,
            },
            magic_links::{MagicLinkIssuedDto, MagicLinkRequestModel, VerifyCodeModel},
            users::{LoginModel, RegisterUserModel, UserDto, normalize_email, validate_password},
        },
    },
};

pub const MAGIC_LINK_VERIFY_PATH: &str = "/api/v1/auth/magic-link/verify";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("{0}")]
    InvalidPassword(String),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired code")]
    InvalidCode,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AuthError::InvalidEmail | AuthError::InvalidPassword(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::InvalidCode => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AuthError>;

/// Signed-in user together with the session token to hand out as a cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserDto,
    pub token: String,
}

pub struct AuthUseCase<U, M>
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    session_tokens: Arc<SessionTokens>,
    magic_links: Arc<MagicLinkSigner>,
    app_base_url: String,
}

impl<U, M> AuthUseCase<U, M>
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        mailer: Arc<M>,
        session_tokens: Arc<SessionTokens>,
        magic_links: Arc<MagicLinkSigner>,
        app_base_url: String,
    ) -> Self {
        Self {
            user_repo,
            mailer,
            session_tokens,
            magic_links,
            app_base_url,
        }
    }

    pub async fn register(&self, model: RegisterUserModel) -> UseCaseResult<AuthSession> {
        let email = normalize_email(&model.email).ok_or(AuthError::InvalidEmail)?;
        validate_password(&model.password).map_err(AuthError::InvalidPassword)?;

        if self.find_user_by_email(&email).await?.is_some() {
            warn!(%email, "auth: registration rejected, email already in use");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&model.password)?;
        let user = self
            .user_repo
            .create(InsertUserEntity {
                email: email.clone(),
                name: model
                    .name
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty()),
                password_hash,
                roles: RoleSet::new([Role::Guest, Role::Customer]).to_strings(),
                subscription_status: SubscriptionStatus::None.to_string(),
                plan_tier: EntitlementTier::None.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%email, db_error = ?err, "auth: failed to create user");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user.id, "auth: user registered");
        self.start_session(user)
    }

    pub async fn login(&self, model: LoginModel) -> UseCaseResult<AuthSession> {
        let email = normalize_email(&model.email).ok_or(AuthError::InvalidEmail)?;
        validate_password(&model.password).map_err(AuthError::InvalidPassword)?;

        let user = self
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.authenticate(user, &model.password)
    }

    pub async fn me(&self, principal: &Principal) -> UseCaseResult<UserDto> {
        let user_id = principal.user_id;
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "auth: failed to load current user");
                AuthError::Internal(err)
            })?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user_view(Some(principal), user))
    }

    /// Emails a sign-in link and a one-time code. Delivery failures are logged and ignored.
    pub async fn request_magic_link(
        &self,
        model: MagicLinkRequestModel,
    ) -> UseCaseResult<MagicLinkIssuedDto> {
        let email = normalize_email(&model.email).ok_or(AuthError::InvalidEmail)?;

        let user = match self.find_user_by_email(&email).await? {
            Some(user) => user,
            None => self.create_passwordless_user(&email).await?,
        };

        let code = random_code();
        let issued = self.magic_links.issue(&email, &code)?;
        let link = self.verify_link_url(&issued.link_token)?;

        let message = EmailMessage {
            to: email.clone(),
            subject: "Your sign-in link".to_string(),
            html: format!(
                "<p>Click <a href=\"{link}\">here</a> to sign in, or enter this code: \
                 <strong>{code}</strong></p><p>The link and code expire in 10 minutes.</p>"
            ),
            text: format!(
                "Sign in: {link}\nOr enter this code: {code}\nThe link and code expire in 10 minutes."
            ),
        };

        if let Err(err) = self.mailer.send(message).await {
            warn!(
                user_id = %user.id,
                error = ?err,
                "auth: failed to send magic link email"
            );
        } else {
            info!(user_id = %user.id, "auth: magic link sent");
        }

        Ok(MagicLinkIssuedDto {
            message: "Check your email for a sign-in link and code".to_string(),
            token: issued.code_token,
            expires_at: issued.expires_at,
        })
    }

    pub async fn verify_code(&self, model: VerifyCodeModel) -> UseCaseResult<AuthSession> {
        let email = normalize_email(&model.email).ok_or(AuthError::InvalidCode)?;
        let Some(email) = self
            .magic_links
            .verify_code(&model.token, &email, model.code.trim())
        else {
            warn!("auth: magic code rejected");
            return Err(AuthError::InvalidCode);
        };

        self.rotate_and_login(&email).await
    }

    pub async fn verify_link(&self, token: &str) -> UseCaseResult<AuthSession> {
        let email = self
            .magic_links
            .verify_link(token)
            .ok_or(AuthError::InvalidCode)?;

        self.rotate_and_login(&email).await
    }

    /// The account's password is replaced by a fresh random one and the session is minted by
    /// logging in with it, so a magic login never reuses a known secret.
    async fn rotate_and_login(&self, email: &str) -> UseCaseResult<AuthSession> {
        let user = self
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let password = random_password();
        let password_hash = hash_password(&password)?;
        self.user_repo
            .update_password_hash(user.id, password_hash.clone())
            .await
            .map_err(|err| {
                error!(user_id = %user.id, db_error = ?err, "auth: failed to rotate password");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user.id, "auth: magic login verified");
        self.authenticate(
            UserEntity {
                password_hash,
                ..user
            },
            &password,
        )
    }

    fn authenticate(&self, user: UserEntity, password: &str) -> UseCaseResult<AuthSession> {
        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "auth: password login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.start_session(user)
    }

    fn start_session(&self, user: UserEntity) -> UseCaseResult<AuthSession> {
        let token = self.session_tokens.issue(&user)?;
        Ok(AuthSession {
            user: UserDto::from(user),
            token,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> UseCaseResult<Option<UserEntity>> {
        self.user_repo.find_by_email(email).await.map_err(|err| {
            error!(db_error = ?err, "auth: failed to look up user by email");
            AuthError::Internal(err)
        })
    }

    async fn create_passwordless_user(&self, email: &str) -> UseCaseResult<UserEntity> {
        let password_hash = hash_password(&random_password())?;
        let user = self
            .user_repo
            .create(InsertUserEntity {
                email: email.to_string(),
                name: None,
                password_hash,
                roles: RoleSet::guest().to_strings(),
                subscription_status: SubscriptionStatus::None.to_string(),
                plan_tier: EntitlementTier::None.to_string(),
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "auth: failed to create passwordless user");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user.id, "auth: passwordless user created");
        Ok(user)
    }

    fn verify_link_url(&self, token: &str) -> UseCaseResult<String> {
        let mut url = Url::parse(&self.app_base_url)
            .and_then(|base| base.join(MAGIC_LINK_VERIFY_PATH))
            .context("invalid app base url")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::interfaces::mailer::MockMailer,
        domain::repositories::users::MockUserRepository,
    };
    use crate::auth::magic_link::MagicLinkClaims;
    use anyhow::anyhow;
    use chrono::Utc;
    use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
    use uuid::Uuid;
    use std::sync::Mutex;

    const SESSION_SECRET: &str = "session-secret-for-tests";
    const MAGIC_SECRET: &str = "magic-secret-for-tests";

    fn sample_user(email: &str, password: &str) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: None,
            password_hash: hash_password(password).unwrap(),
            roles: vec!["guest".to_string(), "customer".to_string()],
            subscription_status: "none".to_string(),
            plan_tier: "none".to_string(),
            host_profile: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn signer() -> MagicLinkSigner {
        MagicLinkSigner::new(MAGIC_SECRET.to_string(), 10)
    }

    fn emailed_code(message: &EmailMessage) -> String {
        message
            .text
            .split("code: ")
            .nth(1)
            .map(|rest| rest.chars().take(6).collect())
            .unwrap()
    }

    fn usecase(
        user_repo: MockUserRepository,
        mailer: MockMailer,
    ) -> AuthUseCase<MockUserRepository, MockMailer> {
        AuthUseCase::new(
            Arc::new(user_repo),
            Arc::new(mailer),
            Arc::new(SessionTokens::new(SESSION_SECRET.to_string(), 7, true)),
            Arc::new(MagicLinkSigner::new(MAGIC_SECRET.to_string(), 10)),
            "https://stay.example.com".to_string(),
        )
    }

    #[tokio::test]
    async fn register_rejects_short_password_before_touching_the_store() {
        let usecase = usecase(MockUserRepository::new(), MockMailer::new());

        let result = usecase
            .register(RegisterUserModel {
                email: "guest@example.com".to_string(),
                password: "short".to_string(),
                name: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidPassword(_))));
    }

    #[tokio::test]
    async fn register_conflicts_on_existing_email() {
        let existing = sample_user("guest@example.com", "password123");
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .withf(|email| email == "guest@example.com")
            .returning(move |_| Ok(Some(existing.clone())));

        let result = usecase(user_repo, MockMailer::new())
            .register(RegisterUserModel {
                email: "Guest@Example.com".to_string(),
                password: "password123".to_string(),
                name: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::EmailTaken)));
        assert_eq!(
            AuthError::EmailTaken.status_code(),
            axum::http::StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn register_grants_guest_and_customer_roles() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(|_| Ok(None));
        user_repo
            .expect_create()
            .withf(|insert| {
                insert.email == "new@example.com"
                    && insert.roles == vec!["guest".to_string(), "customer".to_string()]
            })
            .returning(|insert| {
                let mut user = sample_user(&insert.email, "password123");
                user.roles = insert.roles;
                Ok(user)
            });

        let session = usecase(user_repo, MockMailer::new())
            .register(RegisterUserModel {
                email: "new@example.com".to_string(),
                password: "password123".to_string(),
                name: Some("New Guest".to_string()),
            })
            .await
            .unwrap();

        assert!(session.user.roles.contains(Role::Customer));
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let user = sample_user("guest@example.com", "password123");
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let result = usecase(user_repo, MockMailer::new())
            .login(LoginModel {
                email: "guest@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_session() {
        let user = sample_user("guest@example.com", "password123");
        let user_id = user.id;
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let session = usecase(user_repo, MockMailer::new())
            .login(LoginModel {
                email: "guest@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        let principal = SessionTokens::new(SESSION_SECRET.to_string(), 7, true)
            .verify(&session.token)
            .unwrap();
        assert_eq!(principal.user_id, user_id);
    }

    #[tokio::test]
    async fn request_magic_link_swallows_email_failures() {
        let user = sample_user("guest@example.com", "password123");
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let sent = Arc::new(Mutex::new(None::<EmailMessage>));
        let captured = Arc::clone(&sent);
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(1).returning(move |message| {
            *captured.lock().unwrap() = Some(message);
            Err(anyhow!("smtp down"))
        });

        let issued = usecase(user_repo, mailer)
            .request_magic_link(MagicLinkRequestModel {
                email: "guest@example.com".to_string(),
            })
            .await
            .unwrap();

        let message = sent.lock().unwrap().clone().unwrap();
        let code = emailed_code(&message);
        assert_eq!(message.to, "guest@example.com");
        assert!(
            message
                .text
                .contains("https://stay.example.com/api/v1/auth/magic-link/verify?token=")
        );
        assert!(!message.text.contains(&issued.token));
        assert!(
            signer()
                .verify_code(&issued.token, "guest@example.com", &code)
                .is_some()
        );
    }

    #[tokio::test]
    async fn returned_credential_cannot_open_the_emailed_link() {
        let user = sample_user("guest@example.com", "password123");
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        user_repo.expect_update_password_hash().never();

        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_| Ok(()));

        let usecase = usecase(user_repo, mailer);
        let issued = usecase
            .request_magic_link(MagicLinkRequestModel {
                email: "guest@example.com".to_string(),
            })
            .await
            .unwrap();

        let result = usecase.verify_link(&issued.token).await;

        assert!(matches!(result, Err(AuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn request_magic_link_creates_missing_user_as_guest() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(|_| Ok(None));
        user_repo
            .expect_create()
            .withf(|insert| insert.roles == vec!["guest".to_string()])
            .times(1)
            .returning(|insert| Ok(sample_user(&insert.email, "irrelevant")));

        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_| Ok(()));

        let result = usecase(user_repo, mailer)
            .request_magic_link(MagicLinkRequestModel {
                email: "first@example.com".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn request_magic_link_rejects_invalid_email() {
        let result = usecase(MockUserRepository::new(), MockMailer::new())
            .request_magic_link(MagicLinkRequestModel {
                email: "not-an-email".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidEmail)));
    }

    #[tokio::test]
    async fn verify_code_rotates_password_and_logs_in() {
        let user = sample_user("guest@example.com", "password123");
        let user_id = user.id;
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .withf(|email| email == "guest@example.com")
            .returning(move |_| Ok(Some(user.clone())));
        user_repo
            .expect_update_password_hash()
            .withf(move |id, hash| *id == user_id && !verify_password("password123", hash))
            .times(1)
            .returning(|_, _| Ok(()));

        let token = signer()
            .issue("guest@example.com", "123456")
            .unwrap()
            .code_token;

        let session = usecase(user_repo, MockMailer::new())
            .verify_code(VerifyCodeModel {
                email: "guest@example.com".to_string(),
                code: "123456".to_string(),
                token,
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, user_id);
    }

    #[tokio::test]
    async fn verify_code_with_wrong_code_is_generic_failure() {
        let token = signer()
            .issue("guest@example.com", "123456")
            .unwrap()
            .code_token;

        let result = usecase(MockUserRepository::new(), MockMailer::new())
            .verify_code(VerifyCodeModel {
                email: "guest@example.com".to_string(),
                code: "654321".to_string(),
                token,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn verify_code_rejects_mismatched_email() {
        let token = signer()
            .issue("guest@example.com", "123456")
            .unwrap()
            .code_token;

        let result = usecase(MockUserRepository::new(), MockMailer::new())
            .verify_code(VerifyCodeModel {
                email: "other@example.com".to_string(),
                code: "123456".to_string(),
                token,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn verify_link_for_deleted_user_is_not_found() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(|_| Ok(None));

        let token = signer()
            .issue("gone@example.com", "123456")
            .unwrap()
            .link_token;

        let result = usecase(user_repo, MockMailer::new())
            .verify_link(&token)
            .await;

        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn verify_link_rejects_token_signed_with_another_secret() {
        let token = MagicLinkSigner::new("another-secret".to_string(), 10)
            .issue("guest@example.com", "123456")
            .unwrap()
            .link_token;

        let result = usecase(MockUserRepository::new(), MockMailer::new())
            .verify_link(&token)
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn verify_code_rejects_expired_credential_even_with_the_right_code() {
        let signer = signer();
        let token = signer
            .issue("guest@example.com", "123456")
            .unwrap()
            .code_token;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let mut claims = decode::<MagicLinkClaims>(
            &token,
            &DecodingKey::from_secret(MAGIC_SECRET.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims;
        let past = (Utc::now().timestamp() - 60) as usize;
        claims.iat = past - 600;
        claims.exp = past;
        let expired = signer.sign(&claims).unwrap();

        let result = usecase(MockUserRepository::new(), MockMailer::new())
            .verify_code(VerifyCodeModel {
                email: "guest@example.com".to_string(),
                code: "123456".to_string(),
                token: expired,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn verify_code_rejects_credential_altered_after_signing() {
        let genuine = signer()
            .issue("guest@example.com", "123456")
            .unwrap()
            .code_token;
        let forged = MagicLinkSigner::new("another-secret".to_string(), 10)
            .issue("other@example.com", "123456")
            .unwrap()
            .code_token;

        let genuine_parts: Vec<&str> = genuine.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let altered = format!(
            "{}.{}.{}",
            genuine_parts[0], forged_parts[1], genuine_parts[2]
        );

        let result = usecase(MockUserRepository::new(), MockMailer::new())
            .verify_code(VerifyCodeModel {
                email: "other@example.com".to_string(),
                code: "123456".to_string(),
                token: altered,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCode)));
    }
}
