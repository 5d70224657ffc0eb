use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::interfaces::text_generation::TextGenerator,
    domain::{
        entities::posts::PostEntity,
        repositories::posts::PostRepository,
        value_objects::{
            enums::post_statuses::PostStatus,
            suggestions::{
                PropertyContext, SuggestPackagesModel, SuggestionsDto, build_prompt,
                fallback_suggestions, parse_model_reply, sanitize_recommendations,
            },
        },
    },
};

/// Asks the text model which catalog packages fit a free-form request. Never fails: any
/// problem along the way yields the fallback suggestions.
pub struct PackageSuggestionUseCase<P, T>
where
    P: PostRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    post_repo: Arc<P>,
    text_generator: Option<Arc<T>>,
}

impl<P, T> PackageSuggestionUseCase<P, T>
where
    P: PostRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    pub fn new(post_repo: Arc<P>, text_generator: Option<Arc<T>>) -> Self {
        Self {
            post_repo,
            text_generator,
        }
    }

    pub async fn suggest(&self, model: SuggestPackagesModel) -> SuggestionsDto {
        let description = model.description.trim();
        if description.is_empty() {
            return fallback();
        }

        let Some(text_generator) = self.text_generator.as_ref() else {
            info!("package_suggestions: no text model configured, using fallback");
            return fallback();
        };

        let property = match model.post_id {
            Some(post_id) => match self.post_repo.find_by_id(post_id).await {
                Ok(post) => post.filter(is_public).map(property_context),
                Err(err) => {
                    warn!(%post_id, db_error = ?err, "package_suggestions: failed to load post context");
                    None
                }
            },
            None => None,
        };

        let reply = match text_generator
            .complete(build_prompt(description, property.as_ref()))
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = ?err, "package_suggestions: text model call failed");
                return fallback();
            }
        };

        let Some(raw) = parse_model_reply(&reply) else {
            warn!("package_suggestions: unparseable model reply");
            return fallback();
        };

        let suggestions = sanitize_recommendations(raw);
        if suggestions.is_empty() {
            warn!("package_suggestions: model suggested nothing from the catalog");
            return fallback();
        }

        info!(
            suggestion_count = suggestions.len(),
            "package_suggestions: suggestions generated"
        );
        SuggestionsDto {
            suggestions,
            fallback: false,
        }
    }
}

fn fallback() -> SuggestionsDto {
    SuggestionsDto {
        suggestions: fallback_suggestions(),
        fallback: true,
    }
}

fn is_public(post: &PostEntity) -> bool {
    post.status == PostStatus::Published
}

fn property_context(post: PostEntity) -> PropertyContext {
    PropertyContext {
        title: post.title,
        description: post.description,
        base_rate: post.base_rate,
    }
}
