use std::sync::Arc;

use anyhow::Result as AnyResult;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::access_control::{
        admin_or_published, admin_or_self_field, can_manage_post, permits,
    },
    domain::{
        entities::posts::PostEntity,
        repositories::posts::PostRepository,
        value_objects::{
            access::{Access, Principal},
            enums::post_statuses::PostStatus,
            posts::PostDto,
        },
    },
};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    PostNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PostError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PostError::PostNotFound => StatusCode::NOT_FOUND,
            PostError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Looks a post up by slug first, then by id when the key parses as one.
pub async fn find_post_by_slug_or_id<P>(post_repo: &P, key: &str) -> AnyResult<Option<PostEntity>>
where
    P: PostRepository + Send + Sync,
{
    if let Some(post) = post_repo.find_by_slug(key).await? {
        return Ok(Some(post));
    }

    match Uuid::parse_str(key) {
        Ok(post_id) => post_repo.find_by_id(post_id).await,
        Err(_) => Ok(None),
    }
}

/// Published posts are public; drafts are visible to admins and the owning host.
pub fn can_view_post(principal: Option<&Principal>, post: &PostEntity) -> bool {
    permits(&admin_or_published(principal), post) || can_manage_post(principal, post)
}

/// Per-property package overrides are only shown to admins and the owner.
pub fn post_view(principal: Option<&Principal>, post: PostEntity) -> PostDto {
    let show_settings = admin_or_self_field("owner")(principal, &post);
    let mut dto = PostDto::from(post);
    if !show_settings {
        dto.package_settings.clear();
    }
    dto
}

pub struct PostUseCase<P>
where
    P: PostRepository + Send + Sync + 'static,
{
    post_repo: Arc<P>,
}

impl<P> PostUseCase<P>
where
    P: PostRepository + Send + Sync + 'static,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<PostDto>, PostError> {
        let status = match admin_or_published(principal) {
            Access::All => None,
            _ => Some(PostStatus::Published),
        };

        let posts = self.post_repo.list(status).await.map_err(|err| {
            error!(db_error = ?err, "posts: failed to list posts");
            PostError::Internal(err)
        })?;

        info!(post_count = posts.len(), "posts: posts listed");
        Ok(posts
            .into_iter()
            .map(|post| post_view(principal, post))
            .collect())
    }

    pub async fn get(
        &self,
        principal: Option<&Principal>,
        slug_or_id: &str,
    ) -> Result<PostDto, PostError> {
        let post = find_post_by_slug_or_id(self.post_repo.as_ref(), slug_or_id)
            .await
            .map_err(|err| {
                error!(slug_or_id, db_error = ?err, "posts: failed to load post");
                PostError::Internal(err)
            })?
            .filter(|post| can_view_post(principal, post))
            .ok_or(PostError::PostNotFound)?;

        Ok(post_view(principal, post))
    }
}
