use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use tracing::info;

use crate::{
    application::{
        interfaces::text_generation::TextGenerator,
        usecases::package_suggestions::PackageSuggestionUseCase,
    },
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::posts::PostRepository, value_objects::suggestions::SuggestPackagesModel,
    },
    infrastructure::{
        postgres::{postgres_connection::PgPoolSquad, repositories::posts::PostPostgres},
        text_generation::OpenAiTextGenerator,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let text_generator = config.text_generation.as_ref().map(|text_generation| {
        Arc::new(OpenAiTextGenerator::new(
            text_generation.api_key.clone(),
            text_generation.model.clone(),
            text_generation.base_url.clone(),
        ))
    });
    if text_generator.is_none() {
        info!("packages: no text model configured, suggestions use the fallback catalog");
    }

    let usecase = PackageSuggestionUseCase::new(Arc::new(post_repository), text_generator);

    Router::new()
        .route("/suggest", post(suggest::<PostPostgres, OpenAiTextGenerator>))
        .with_state(Arc::new(usecase))
}

pub async fn suggest<P, T>(
    State(usecase): State<Arc<PackageSuggestionUseCase<P, T>>>,
    Json(model): Json<SuggestPackagesModel>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    Json(usecase.suggest(model).await)
}
