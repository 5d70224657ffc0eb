use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{post, put},
};
use axum_extra::extract::CookieJar;
use tracing::info;
use uuid::Uuid;

use super::auth::SessionResponse;
use crate::{
    application::usecases::users::UserUseCase,
    auth::{AuthUser, SessionTokens},
    domain::{
        repositories::users::UserRepository,
        value_objects::users::{AssignRolesModel, RoleUpgradeModel},
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, session_tokens: Arc<SessionTokens>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let usecase = UserUseCase::new(Arc::new(user_repository), session_tokens);

    Router::new()
        .route("/me/roles", post(upgrade_own_role::<UserPostgres>))
        .route("/:user_id/roles", put(assign_roles::<UserPostgres>))
        .with_state(Arc::new(usecase))
}

pub async fn upgrade_own_role<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    Extension(session_tokens): Extension<Arc<SessionTokens>>,
    AuthUser(principal): AuthUser,
    jar: CookieJar,
    Json(model): Json<RoleUpgradeModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    info!(user_id = %principal.user_id, role = %model.role, "users: role upgrade requested");

    match usecase.upgrade_own_role(&principal, model).await {
        Ok(session) => {
            let jar = jar.add(session_tokens.session_cookie(session.token.clone()));
            let body = SessionResponse {
                user: session.user,
                token: session.token,
            };
            (jar, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn assign_roles<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(model): Json<AssignRolesModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match usecase.assign_roles(&principal, user_id, model).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}
