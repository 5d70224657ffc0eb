use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{
        interfaces::{commerce::CommerceCatalog, payments::PaymentVerifier},
        usecases::estimates::EstimateUseCase,
    },
    auth::AuthUser,
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{
            bookings::BookingRepository, estimates::EstimateRepository,
            packages::PackageRepository, posts::PostRepository, users::UserRepository,
        },
        value_objects::{
            bookings::{ConfirmEstimateModel, UpsertEstimateModel},
            offers::CatalogDefaults,
        },
    },
    infrastructure::{
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                bookings::BookingPostgres, estimates::EstimatePostgres, packages::PackagePostgres,
                posts::PostPostgres, users::UserPostgres,
            },
        },
        revenue_cat::RevenueCatClient,
        yoco::YocoClient,
    },
};

#[derive(Debug, Deserialize)]
pub struct LatestEstimateQuery {
    post_id: Uuid,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let estimate_repository = EstimatePostgres::new(Arc::clone(&db_pool));
    let booking_repository = BookingPostgres::new(Arc::clone(&db_pool));
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let package_repository = PackagePostgres::new(Arc::clone(&db_pool));
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let commerce = RevenueCatClient::new(
        config.revenue_cat.api_key.clone(),
        config.revenue_cat.project_id.clone(),
        config.revenue_cat.base_url.clone(),
    );
    let payment_verifier = YocoClient::new(config.yoco.secret_key.clone(), config.yoco.base_url.clone());

    let usecase = EstimateUseCase::new(
        Arc::new(estimate_repository),
        Arc::new(booking_repository),
        Arc::new(post_repository),
        Arc::new(package_repository),
        Arc::new(user_repository),
        Arc::new(commerce),
        Arc::new(payment_verifier),
        CatalogDefaults {
            external_enabled: config.catalog.external_packages_enabled_by_default,
        },
    );

    Router::new()
        .route(
            "/",
            post(upsert::<EstimatePostgres, BookingPostgres, PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient, YocoClient>),
        )
        .route(
            "/latest",
            get(latest::<EstimatePostgres, BookingPostgres, PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient, YocoClient>),
        )
        .route(
            "/:estimate_id/confirm",
            post(confirm::<EstimatePostgres, BookingPostgres, PostPostgres, PackagePostgres, UserPostgres, RevenueCatClient, YocoClient>),
        )
        .with_state(Arc::new(usecase))
}

pub async fn upsert<E, B, P, K, U, C, V>(
    State(usecase): State<Arc<EstimateUseCase<E, B, P, K, U, C, V>>>,
    AuthUser(principal): AuthUser,
    Json(model): Json<UpsertEstimateModel>,
) -> impl IntoResponse
where
    E: EstimateRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
    V: PaymentVerifier + Send + Sync + 'static,
{
    match usecase.upsert(&principal, model).await {
        Ok(estimate) => Json(estimate).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn latest<E, B, P, K, U, C, V>(
    State(usecase): State<Arc<EstimateUseCase<E, B, P, K, U, C, V>>>,
    AuthUser(principal): AuthUser,
    Query(query): Query<LatestEstimateQuery>,
) -> impl IntoResponse
where
    E: EstimateRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
    V: PaymentVerifier + Send + Sync + 'static,
{
    match usecase.latest(&principal, query.post_id).await {
        Ok(estimate) => Json(estimate).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn confirm<E, B, P, K, U, C, V>(
    State(usecase): State<Arc<EstimateUseCase<E, B, P, K, U, C, V>>>,
    AuthUser(principal): AuthUser,
    Path(estimate_id): Path<Uuid>,
    Json(model): Json<ConfirmEstimateModel>,
) -> impl IntoResponse
where
    E: EstimateRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
    V: PaymentVerifier + Send + Sync + 'static,
{
    match usecase.confirm(&principal, estimate_id, model).await {
        Ok(confirmed) => Json(confirmed).into_response(),
        Err(err) => err.into_response(),
    }
}
