use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::bookings::BookingUseCase,
    auth::AuthUser,
    domain::{
        repositories::{bookings::BookingRepository, posts::PostRepository},
        value_objects::bookings::CreateBookingModel,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{bookings::BookingPostgres, posts::PostPostgres},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct BookingsQuery {
    #[serde(default)]
    all: bool,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let booking_repository = BookingPostgres::new(Arc::clone(&db_pool));
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let usecase = BookingUseCase::new(Arc::new(booking_repository), Arc::new(post_repository));

    Router::new()
        .route(
            "/",
            get(overview::<BookingPostgres, PostPostgres>).post(create::<BookingPostgres, PostPostgres>),
        )
        .route("/:booking_id", get(get_booking::<BookingPostgres, PostPostgres>))
        .with_state(Arc::new(usecase))
}

pub async fn create<B, P>(
    State(usecase): State<Arc<BookingUseCase<B, P>>>,
    AuthUser(principal): AuthUser,
    Json(model): Json<CreateBookingModel>,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
{
    match usecase.create(&principal, model).await {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn overview<B, P>(
    State(usecase): State<Arc<BookingUseCase<B, P>>>,
    AuthUser(principal): AuthUser,
    Query(query): Query<BookingsQuery>,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
{
    info!(user_id = %principal.user_id, all = query.all, "bookings: overview request received");

    match usecase.overview(&principal, query.all).await {
        Ok(overview) => Json(overview).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_booking<B, P>(
    State(usecase): State<Arc<BookingUseCase<B, P>>>,
    AuthUser(principal): AuthUser,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
{
    match usecase.get(&principal, booking_id).await {
        Ok(booking) => Json(booking).into_response(),
        Err(err) => err.into_response(),
    }
}
