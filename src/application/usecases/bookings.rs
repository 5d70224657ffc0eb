use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::{
        access_control::{admin_or_customer, admin_or_self, permits},
        usecases::posts::{can_view_post, find_post_by_slug_or_id},
    },
    auth::password::random_token,
    domain::{
        entities::bookings::InsertBookingEntity,
        repositories::{bookings::BookingRepository, posts::PostRepository},
        value_objects::{
            access::{Access, Principal},
            bookings::{BookingDto, BookingsOverviewDto, CreateBookingModel, guests_to_json},
            enums::payment_statuses::PaymentStatus,
            stays::StayRange,
        },
    },
};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("only customers can book")]
    CustomerRequired,
    #[error("to_date must be after from_date")]
    InvalidStay,
    #[error("every guest needs a name")]
    InvalidGuest,
    #[error("post not found")]
    PostNotFound,
    #[error("booking not found")]
    BookingNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BookingError::CustomerRequired => StatusCode::FORBIDDEN,
            BookingError::InvalidStay | BookingError::InvalidGuest => StatusCode::BAD_REQUEST,
            BookingError::PostNotFound | BookingError::BookingNotFound => StatusCode::NOT_FOUND,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

pub struct BookingUseCase<B, P>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    post_repo: Arc<P>,
}

impl<B, P> BookingUseCase<B, P>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
{
    pub fn new(booking_repo: Arc<B>, post_repo: Arc<P>) -> Self {
        Self {
            booking_repo,
            post_repo,
        }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        model: CreateBookingModel,
    ) -> UseCaseResult<BookingDto> {
        if !admin_or_customer(Some(principal)) {
            return Err(BookingError::CustomerRequired);
        }

        let stay =
            StayRange::new(model.from_date, model.to_date).ok_or(BookingError::InvalidStay)?;
        if model.guests.iter().any(|guest| guest.name.trim().is_empty()) {
            return Err(BookingError::InvalidGuest);
        }

        let post = find_post_by_slug_or_id(self.post_repo.as_ref(), model.post.trim())
            .await
            .map_err(|err| {
                error!(post = %model.post, db_error = ?err, "bookings: failed to resolve post");
                BookingError::Internal(err)
            })?
            .filter(|post| can_view_post(Some(principal), post))
            .ok_or(BookingError::PostNotFound)?;

        let booking = self
            .booking_repo
            .create(InsertBookingEntity {
                post_id: post.id,
                customer_id: principal.user_id,
                estimate_id: None,
                guests: guests_to_json(&model.guests),
                from_date: stay.from_date,
                to_date: stay.to_date,
                payment_status: PaymentStatus::Unpaid.to_string(),
                token: random_token(),
                title: post.title,
            })
            .await
            .map_err(|err| {
                error!(customer_id = %principal.user_id, post_id = %post.id, db_error = ?err, "bookings: failed to create booking");
                BookingError::Internal(err)
            })?;

        info!(
            booking_id = %booking.id,
            customer_id = %principal.user_id,
            nights = stay.nights(),
            "bookings: booking created"
        );
        Ok(BookingDto::from(booking))
    }

    /// Upcoming and past bookings visible to the caller. Admins see their own unless `all`.
    pub async fn overview(
        &self,
        principal: &Principal,
        all: bool,
    ) -> UseCaseResult<BookingsOverviewDto> {
        let customer_id = match admin_or_self("customer")(Some(principal)) {
            Access::All if all => None,
            Access::All => Some(principal.user_id),
            Access::Where(filter) => Some(filter.id_value().unwrap_or(principal.user_id)),
            Access::Denied => return Err(BookingError::CustomerRequired),
        };

        let now = Utc::now();
        let (upcoming, past) = tokio::join!(
            self.booking_repo.list_upcoming(customer_id, now),
            self.booking_repo.list_past(customer_id, now),
        );

        let upcoming = upcoming.map_err(|err| {
            error!(user_id = %principal.user_id, db_error = ?err, "bookings: failed to list upcoming bookings");
            BookingError::Internal(err)
        })?;
        let past = past.map_err(|err| {
            error!(user_id = %principal.user_id, db_error = ?err, "bookings: failed to list past bookings");
            BookingError::Internal(err)
        })?;

        Ok(BookingsOverviewDto {
            upcoming: upcoming.into_iter().map(BookingDto::from).collect(),
            past: past.into_iter().map(BookingDto::from).collect(),
        })
    }

    pub async fn get(&self, principal: &Principal, booking_id: Uuid) -> UseCaseResult<BookingDto> {
        let access = admin_or_self("customer")(Some(principal));
        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to load booking");
                BookingError::Internal(err)
            })?
            .filter(|booking| permits(&access, booking))
            .ok_or(BookingError::BookingNotFound)?;

        Ok(BookingDto::from(booking))
    }
}
