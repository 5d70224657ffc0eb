use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH, VARY},
    },
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use sha2::{Digest, Sha256};
use tracing::error;
use uuid::Uuid;

use crate::{
    application::{
        interfaces::commerce::CommerceCatalog,
        usecases::{packages::PackageUseCase, posts::PostUseCase},
    },
    auth::MaybeAuthUser,
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{packages::PackageRepository, posts::PostRepository, users::UserRepository},
        value_objects::{
            offers::CatalogDefaults,
            packages::{
                BulkDeletePackagesModel, CreatePackageModel, PackageListQuery,
                PackageSettingsModel, UpdatePackageModel,
            },
        },
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{packages::PackagePostgres, posts::PostPostgres, users::UserPostgres},
        },
        revenue_cat::RevenueCatClient,
    },
};

pub const PACKAGE_LIST_CACHE_CONTROL: &str =
    "public, max-age=60, s-maxage=300, stale-while-revalidate=600";

type Packages = PackageUseCase<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>;

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let post_repository = Arc::new(PostPostgres::new(Arc::clone(&db_pool)));
    let package_repository = PackagePostgres::new(Arc::clone(&db_pool));
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let commerce = RevenueCatClient::new(
        config.revenue_cat.api_key.clone(),
        config.revenue_cat.project_id.clone(),
        config.revenue_cat.base_url.clone(),
    );

    let post_usecase = PostUseCase::new(Arc::clone(&post_repository));
    let package_usecase: Packages = PackageUseCase::new(
        post_repository,
        Arc::new(package_repository),
        Arc::new(user_repository),
        Arc::new(commerce),
        CatalogDefaults {
            external_enabled: config.catalog.external_packages_enabled_by_default,
        },
    );

    let post_routes = Router::new()
        .route("/", get(list_posts::<PostPostgres>))
        .route("/:post_id", get(get_post::<PostPostgres>))
        .with_state(Arc::new(post_usecase));

    let package_routes = Router::new()
        .route(
            "/:post_id/packages",
            get(list_packages::<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>)
                .post(create_package::<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>)
                .delete(delete_packages::<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>),
        )
        .route(
            "/:post_id/packages/sync",
            post(sync_packages::<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>),
        )
        .route(
            "/:post_id/packages/:package_id",
            patch(update_package::<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>),
        )
        .route(
            "/:post_id/package-settings",
            put(replace_package_settings::<PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient>),
        )
        .with_state(Arc::new(package_usecase));

    post_routes.merge(package_routes)
}

pub async fn list_posts<P>(
    State(usecase): State<Arc<PostUseCase<P>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
{
    match usecase.list(principal.as_ref()).await {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_post<P>(
    State(usecase): State<Arc<PostUseCase<P>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(slug_or_id): Path<String>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
{
    match usecase.get(principal.as_ref(), &slug_or_id).await {
        Ok(post) => Json(post).into_response(),
        Err(err) => err.into_response(),
    }
}

/// JSON body with a content-hash `ETag`; answers `304` when the client already holds it.
pub fn cached_json<T>(payload: &T, headers: &HeaderMap) -> Response
where
    T: serde::Serialize,
{
    let body = match serde_json::to_vec(payload) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "packages: failed to serialize package list");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode response");
        }
    };

    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&body)));
    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == etag || candidate == "*")
        });

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response()
    };

    let response_headers = response.headers_mut();
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static(PACKAGE_LIST_CACHE_CONTROL));
    response_headers.insert(VARY, HeaderValue::from_static("Authorization, Cookie"));
    if let Ok(etag) = HeaderValue::from_str(&etag) {
        response_headers.insert(ETAG, etag);
    }

    response
}

pub async fn list_packages<P, K, U, C>(
    State(usecase): State<Arc<PackageUseCase<P, K, U, C>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(post_id): Path<Uuid>,
    Query(query): Query<PackageListQuery>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    match usecase.list_offers(principal.as_ref(), post_id, query).await {
        Ok(offers) => cached_json(&offers, &headers),
        Err(err) => err.into_response(),
    }
}

pub async fn create_package<P, K, U, C>(
    State(usecase): State<Arc<PackageUseCase<P, K, U, C>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(post_id): Path<Uuid>,
    Json(model): Json<CreatePackageModel>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    match usecase.create_package(principal.as_ref(), post_id, model).await {
        Ok(package) => (StatusCode::CREATED, Json(package)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_package<P, K, U, C>(
    State(usecase): State<Arc<PackageUseCase<P, K, U, C>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path((post_id, package_id)): Path<(Uuid, Uuid)>,
    Json(model): Json<UpdatePackageModel>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    match usecase
        .update_package(principal.as_ref(), post_id, package_id, model)
        .await
    {
        Ok(package) => Json(package).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_packages<P, K, U, C>(
    State(usecase): State<Arc<PackageUseCase<P, K, U, C>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(post_id): Path<Uuid>,
    Json(model): Json<BulkDeletePackagesModel>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    match usecase.delete_packages(principal.as_ref(), post_id, model).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn replace_package_settings<P, K, U, C>(
    State(usecase): State<Arc<PackageUseCase<P, K, U, C>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(post_id): Path<Uuid>,
    Json(model): Json<PackageSettingsModel>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    match usecase.replace_settings(principal.as_ref(), post_id, model).await {
        Ok(settings) => Json(settings).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn sync_packages<P, K, U, C>(
    State(usecase): State<Arc<PackageUseCase<P, K, U, C>>>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(post_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    match usecase.sync_products(principal.as_ref(), post_id).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etag_of(response: &Response) -> String {
        response.headers()[ETAG].to_str().unwrap().to_string()
    }

    #[test]
    fn fresh_response_carries_cache_headers() {
        let response = cached_json(&serde_json::json!([{ "key": "a" }]), &HeaderMap::new());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], PACKAGE_LIST_CACHE_CONTROL);
        let etag = etag_of(&response);
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag.len(), 64 + 2);
    }

    #[test]
    fn matching_etag_yields_not_modified() {
        let payload = serde_json::json!([{ "key": "a" }]);
        let etag = etag_of(&cached_json(&payload, &HeaderMap::new()));

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap());
        let response = cached_json(&payload, &headers);

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(etag_of(&response), etag);
    }

    #[test]
    fn changed_payload_changes_etag() {
        let first = etag_of(&cached_json(&serde_json::json!([1]), &HeaderMap::new()));

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&first).unwrap());
        let response = cached_json(&serde_json::json!([2]), &headers);

        assert_eq!(response.status(), StatusCode::OK);
        assert_ne!(etag_of(&response), first);
    }
}
