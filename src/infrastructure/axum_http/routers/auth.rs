use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::{
    application::{
        interfaces::mailer::Mailer,
        usecases::auth::{AuthSession, AuthUseCase},
    },
    auth::{AuthUser, SessionTokens, magic_link::MagicLinkSigner},
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::users::UserRepository,
        value_objects::{
            magic_links::{MagicLinkRequestModel, VerifyCodeModel, VerifyLinkQuery},
            users::{LoginModel, RegisterUserModel, UserDto},
        },
    },
    infrastructure::{
        mailer::ResendMailer,
        postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
    },
};

/// Where the browser lands after following a magic link.
#[derive(Debug, Clone)]
pub struct LandingPage {
    base_url: String,
    path: String,
}

impl LandingPage {
    pub fn new(base_url: String, path: String) -> Self {
        Self { base_url, path }
    }

    pub fn url(&self, auth_error: Option<&str>) -> String {
        let mut url = match Url::parse(&self.base_url).and_then(|base| base.join(&self.path)) {
            Ok(url) => url,
            Err(_) => return self.fallback(auth_error),
        };

        if let Some(auth_error) = auth_error {
            url.query_pairs_mut().append_pair("auth_error", auth_error);
        }

        url.to_string()
    }

    fn fallback(&self, auth_error: Option<&str>) -> String {
        match auth_error {
            Some(auth_error) => format!("{}?auth_error={}", self.path, auth_error),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserDto,
    pub token: String,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    session_tokens: Arc<SessionTokens>,
) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let mailer = ResendMailer::new(
        config.email.api_key.clone(),
        config.email.from.clone(),
        config.email.base_url.clone(),
    );
    let magic_links = MagicLinkSigner::new(
        config.auth.magic_link_secret.clone(),
        config.auth.magic_link_ttl_minutes,
    );
    let usecase = AuthUseCase::new(
        Arc::new(user_repository),
        Arc::new(mailer),
        session_tokens,
        Arc::new(magic_links),
        config.app.base_url.clone(),
    );
    let landing_page = LandingPage::new(config.app.base_url.clone(), config.app.landing_path.clone());

    Router::new()
        .route("/register", post(register::<UserPostgres, ResendMailer>))
        .route("/login", post(login::<UserPostgres, ResendMailer>))
        .route("/logout", post(logout))
        .route("/me", get(me::<UserPostgres, ResendMailer>))
        .route("/magic-link", post(request_magic_link::<UserPostgres, ResendMailer>))
        .route(
            "/magic-link/verify-code",
            post(verify_code::<UserPostgres, ResendMailer>),
        )
        .route("/magic-link/verify", get(verify_link::<UserPostgres, ResendMailer>))
        .layer(Extension(landing_page))
        .with_state(Arc::new(usecase))
}

fn signed_in(
    jar: CookieJar,
    session_tokens: &SessionTokens,
    session: AuthSession,
    status: StatusCode,
) -> Response {
    let jar = jar.add(session_tokens.session_cookie(session.token.clone()));
    let body = SessionResponse {
        user: session.user,
        token: session.token,
    };

    (status, jar, Json(body)).into_response()
}

pub async fn register<U, M>(
    State(usecase): State<Arc<AuthUseCase<U, M>>>,
    Extension(session_tokens): Extension<Arc<SessionTokens>>,
    jar: CookieJar,
    Json(model): Json<RegisterUserModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    match usecase.register(model).await {
        Ok(session) => signed_in(jar, &session_tokens, session, StatusCode::CREATED),
        Err(err) => err.into_response(),
    }
}

pub async fn login<U, M>(
    State(usecase): State<Arc<AuthUseCase<U, M>>>,
    Extension(session_tokens): Extension<Arc<SessionTokens>>,
    jar: CookieJar,
    Json(model): Json<LoginModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    match usecase.login(model).await {
        Ok(session) => signed_in(jar, &session_tokens, session, StatusCode::OK),
        Err(err) => err.into_response(),
    }
}

pub async fn logout(
    Extension(session_tokens): Extension<Arc<SessionTokens>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = jar.add(session_tokens.removal_cookie());
    (StatusCode::NO_CONTENT, jar).into_response()
}

pub async fn me<U, M>(
    State(usecase): State<Arc<AuthUseCase<U, M>>>,
    AuthUser(principal): AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    match usecase.me(&principal).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn request_magic_link<U, M>(
    State(usecase): State<Arc<AuthUseCase<U, M>>>,
    Json(model): Json<MagicLinkRequestModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    match usecase.request_magic_link(model).await {
        Ok(issued) => Json(issued).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn verify_code<U, M>(
    State(usecase): State<Arc<AuthUseCase<U, M>>>,
    Extension(session_tokens): Extension<Arc<SessionTokens>>,
    jar: CookieJar,
    Json(model): Json<VerifyCodeModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    match usecase.verify_code(model).await {
        Ok(session) => signed_in(jar, &session_tokens, session, StatusCode::OK),
        Err(err) => err.into_response(),
    }
}

/// Browser entry point of the emailed link; always answers with a redirect.
pub async fn verify_link<U, M>(
    State(usecase): State<Arc<AuthUseCase<U, M>>>,
    Extension(session_tokens): Extension<Arc<SessionTokens>>,
    Extension(landing_page): Extension<LandingPage>,
    jar: CookieJar,
    Query(query): Query<VerifyLinkQuery>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    match usecase.verify_link(&query.token).await {
        Ok(session) => {
            info!(user_id = %session.user.id, "auth: magic link accepted");
            let jar = jar.add(session_tokens.session_cookie(session.token));
            (jar, Redirect::to(&landing_page.url(None))).into_response()
        }
        Err(err) => {
            warn!(error = %err, "auth: magic link rejected");
            Redirect::to(&landing_page.url(Some("invalid_link"))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_url_joins_base_and_path() {
        let landing = LandingPage::new("https://stay.example.com".to_string(), "/welcome".to_string());

        assert_eq!(landing.url(None), "https://stay.example.com/welcome");
        assert_eq!(
            landing.url(Some("invalid_link")),
            "https://stay.example.com/welcome?auth_error=invalid_link"
        );
    }

    #[test]
    fn unparsable_base_falls_back_to_relative_path() {
        let landing = LandingPage::new("not a url".to_string(), "/".to_string());

        assert_eq!(landing.url(Some("invalid_link")), "/?auth_error=invalid_link");
    }
}
