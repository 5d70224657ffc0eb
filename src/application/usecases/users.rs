use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        access_control::{admin_or_self_field, is_admin, is_admin_field, is_host_field},
        usecases::auth::AuthSession,
    },
    auth::SessionTokens,
    domain::{
        entities::users::UserEntity,
        repositories::users::UserRepository,
        value_objects::{
            access::Principal,
            enums::roles::{Role, RoleSet},
            users::{AssignRolesModel, RoleUpgradeModel, UserDto},
        },
    },
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("role {0} cannot be requested")]
    RoleNotRequestable(Role),
    #[error("only an admin can grant the admin role")]
    AdminRequired,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UserError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            UserError::RoleNotRequestable(_) => StatusCode::BAD_REQUEST,
            UserError::AdminRequired => StatusCode::FORBIDDEN,
            UserError::UserNotFound => StatusCode::NOT_FOUND,
            UserError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, UserError>;

/// The host profile carries payout details: admins see it, hosts only their own.
pub fn user_view(principal: Option<&Principal>, user: UserEntity) -> UserDto {
    let show_host_profile = is_admin_field(principal)
        || (is_host_field(principal) && admin_or_self_field("id")(principal, &user));
    let mut dto = UserDto::from(user);
    if !show_host_profile {
        dto.host_profile = None;
    }
    dto
}

pub struct UserUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_tokens: Arc<SessionTokens>,
}

impl<U> UserUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, session_tokens: Arc<SessionTokens>) -> Self {
        Self {
            user_repo,
            session_tokens,
        }
    }

    /// Adds `customer` or `host` to the caller's own roles and reissues the session so the
    /// new role is visible on the next request.
    pub async fn upgrade_own_role(
        &self,
        principal: &Principal,
        model: RoleUpgradeModel,
    ) -> UseCaseResult<AuthSession> {
        let user_id = principal.user_id;
        match model.role {
            Role::Customer | Role::Host => {}
            Role::Admin => {
                warn!(%user_id, "users: self-service admin upgrade rejected");
                return Err(UserError::AdminRequired);
            }
            Role::Guest => return Err(UserError::RoleNotRequestable(Role::Guest)),
        }

        let user = self.load_user(user_id).await?;

        if let (Role::Host, Some(profile)) = (model.role, model.host_profile.as_ref()) {
            let profile = serde_json::to_value(profile).map_err(anyhow::Error::from)?;
            self.user_repo
                .update_host_profile(user_id, profile)
                .await
                .map_err(|err| {
                    error!(%user_id, db_error = ?err, "users: failed to save host profile");
                    UserError::Internal(err)
                })?;
        }

        let mut roles = user.role_set();
        let user = if roles.insert(model.role) {
            let user = self.save_roles(user_id, &roles).await?;
            info!(%user_id, role = %model.role, "users: role added");
            user
        } else {
            user
        };

        let token = self.session_tokens.issue(&user)?;
        Ok(AuthSession {
            user: UserDto::from(user),
            token,
        })
    }

    /// Replaces the role set of any user. Admin only; `guest` is always kept.
    pub async fn assign_roles(
        &self,
        principal: &Principal,
        user_id: Uuid,
        model: AssignRolesModel,
    ) -> UseCaseResult<UserDto> {
        if !is_admin(Some(principal)) {
            warn!(
                actor_id = %principal.user_id,
                %user_id,
                "users: role assignment by non-admin rejected"
            );
            return Err(UserError::AdminRequired);
        }

        self.load_user(user_id).await?;

        let mut roles = RoleSet::new(model.roles);
        roles.insert(Role::Guest);
        let user = self.save_roles(user_id, &roles).await?;

        info!(
            actor_id = %principal.user_id,
            %user_id,
            roles = ?roles.to_strings(),
            "users: roles assigned"
        );
        Ok(user_view(Some(principal), user))
    }

    async fn load_user(&self, user_id: Uuid) -> UseCaseResult<UserEntity> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "users: failed to load user");
                UserError::Internal(err)
            })?
            .ok_or(UserError::UserNotFound)
    }

    async fn save_roles(&self, user_id: Uuid, roles: &RoleSet) -> UseCaseResult<UserEntity> {
        self.user_repo
            .update_roles(user_id, roles.to_strings())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "users: failed to update roles");
                UserError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        repositories::users::MockUserRepository, value_objects::users::HostProfile,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn sample_user(id: Uuid, roles: &[&str]) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id,
            email: "member@example.com".to_string(),
            name: None,
            password_hash: String::new(),
            roles: roles.iter().map(|role| role.to_string()).collect(),
            subscription_status: "none".to_string(),
            plan_tier: "none".to_string(),
            host_profile: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn principal(id: Uuid, roles: &[Role]) -> Principal {
        Principal {
            user_id: id,
            email: "member@example.com".to_string(),
            roles: RoleSet::new(roles.iter().copied()),
        }
    }

    fn usecase(user_repo: MockUserRepository) -> UserUseCase<MockUserRepository> {
        UserUseCase::new(
            Arc::new(user_repo),
            Arc::new(SessionTokens::new("secret".to_string(), 7, false)),
        )
    }

    #[tokio::test]
    async fn self_upgrade_to_host_saves_profile_and_reissues_session() {
        let user_id = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |id| Ok(Some(sample_user(id, &["guest", "customer"]))));
        user_repo
            .expect_update_host_profile()
            .times(1)
            .returning(|_, _| Ok(()));
        user_repo
            .expect_update_roles()
            .withf(|_, roles| roles.contains(&"host".to_string()))
            .times(1)
            .returning(|id, roles| {
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                Ok(sample_user(id, &roles))
            });

        let session = usecase(user_repo)
            .upgrade_own_role(
                &principal(user_id, &[Role::Guest, Role::Customer]),
                RoleUpgradeModel {
                    role: Role::Host,
                    host_profile: Some(HostProfile {
                        bio: Some("Beach house owner".to_string()),
                        ..Default::default()
                    }),
                },
            )
            .await
            .unwrap();

        assert!(session.user.roles.contains(Role::Host));
        let refreshed = SessionTokens::new("secret".to_string(), 7, false)
            .verify(&session.token)
            .unwrap();
        assert!(refreshed.has_role(Role::Host));
    }

    #[tokio::test]
    async fn self_upgrade_to_admin_is_forbidden() {
        let user_id = Uuid::new_v4();

        let result = usecase(MockUserRepository::new())
            .upgrade_own_role(
                &principal(user_id, &[Role::Customer]),
                RoleUpgradeModel {
                    role: Role::Admin,
                    host_profile: None,
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::AdminRequired)));
    }

    #[tokio::test]
    async fn existing_role_upgrade_does_not_write() {
        let user_id = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, &["guest", "customer"]))));
        user_repo.expect_update_roles().never();

        let session = usecase(user_repo)
            .upgrade_own_role(
                &principal(user_id, &[Role::Customer]),
                RoleUpgradeModel {
                    role: Role::Customer,
                    host_profile: None,
                },
            )
            .await
            .unwrap();

        assert!(session.user.roles.contains(Role::Customer));
    }

    #[tokio::test]
    async fn non_admin_cannot_assign_roles() {
        let result = usecase(MockUserRepository::new())
            .assign_roles(
                &principal(Uuid::new_v4(), &[Role::Host]),
                Uuid::new_v4(),
                AssignRolesModel {
                    roles: vec![Role::Admin],
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::AdminRequired)));
        assert_eq!(
            UserError::AdminRequired.status_code(),
            axum::http::StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn admin_assignment_keeps_guest_role() {
        let target = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(target))
            .returning(|id| Ok(Some(sample_user(id, &["guest"]))));
        user_repo
            .expect_update_roles()
            .with(
                eq(target),
                eq(vec!["guest".to_string(), "admin".to_string()]),
            )
            .returning(|id, roles| {
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                Ok(sample_user(id, &roles))
            });

        let user = usecase(user_repo)
            .assign_roles(
                &principal(Uuid::new_v4(), &[Role::Admin]),
                target,
                AssignRolesModel {
                    roles: vec![Role::Admin],
                },
            )
            .await
            .unwrap();

        assert!(user.roles.contains(Role::Admin));
        assert!(user.roles.contains(Role::Guest));
    }

    #[test]
    fn host_profile_is_shown_to_admins_and_its_host_only() {
        let host_id = Uuid::new_v4();
        let mut host = sample_user(host_id, &["guest", "host"]);
        host.host_profile = Some(serde_json::json!({ "payout_email": "pay@example.com" }));

        let own = user_view(Some(&principal(host_id, &[Role::Host])), host.clone());
        let admin = user_view(Some(&principal(Uuid::new_v4(), &[Role::Admin])), host.clone());
        let other_host = user_view(Some(&principal(Uuid::new_v4(), &[Role::Host])), host.clone());
        let demoted = user_view(Some(&principal(host_id, &[Role::Customer])), host);

        assert!(own.host_profile.is_some());
        assert!(admin.host_profile.is_some());
        assert!(other_host.host_profile.is_none());
        assert!(demoted.host_profile.is_none());
    }
}
