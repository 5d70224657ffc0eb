use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        access_control::{admin_or_customer, admin_or_self, permits},
        interfaces::{
            commerce::CommerceCatalog,
            payments::{CheckoutState, PaymentVerifier},
        },
        usecases::entitlements::EntitlementResolver,
    },
    auth::password::random_token,
    domain::{
        entities::{
            bookings::InsertBookingEntity,
            estimates::{EstimateEntity, InsertEstimateEntity, RequoteEstimateEntity},
            posts::PostEntity,
        },
        repositories::{
            bookings::BookingRepository, estimates::EstimateRepository,
            packages::PackageRepository, posts::PostRepository, users::UserRepository,
        },
        value_objects::{
            access::Principal,
            bookings::{
                BookingDto, ConfirmEstimateModel, ConfirmedEstimateDto, EstimateDto,
                UpsertEstimateModel, guests_to_json,
            },
            enums::{
                entitlement_tiers::EntitlementTier, estimate_statuses::EstimateStatus,
                payment_statuses::PaymentStatus,
            },
            offers::{CatalogDefaults, OfferFilter, merge_offers, visible_offers},
            stays::{StayRange, stay_total},
        },
    },
};

/// Currency every checkout is expected to be charged in.
pub const CHECKOUT_CURRENCY: &str = "ZAR";

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("only customers can request estimates")]
    CustomerRequired,
    #[error("to_date must be after from_date")]
    InvalidStay,
    #[error("unknown package {0}")]
    UnknownPackage(String),
    #[error("post not found")]
    PostNotFound,
    #[error("estimate not found")]
    EstimateNotFound,
    #[error("payment has not been validated by the client")]
    PaymentNotValidated,
    #[error("checkout_id is required")]
    MissingCheckout,
    #[error("estimate is already paid")]
    AlreadyPaid,
    #[error("payment provider reports checkout as {0}")]
    PaymentIncomplete(String),
    #[error("checkout does not match this estimate: {0}")]
    CheckoutMismatch(String),
    #[error("checkout has already been used for another estimate")]
    CheckoutReused,
    #[error("commerce catalog unavailable: {0}")]
    CatalogUnavailable(anyhow::Error),
    #[error("payment provider unavailable: {0}")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EstimateError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            EstimateError::CustomerRequired => StatusCode::FORBIDDEN,
            EstimateError::InvalidStay
            | EstimateError::UnknownPackage(_)
            | EstimateError::PaymentNotValidated
            | EstimateError::MissingCheckout => StatusCode::BAD_REQUEST,
            EstimateError::PostNotFound | EstimateError::EstimateNotFound => {
                StatusCode::NOT_FOUND
            }
            EstimateError::AlreadyPaid
            | EstimateError::PaymentIncomplete(_)
            | EstimateError::CheckoutMismatch(_)
            | EstimateError::CheckoutReused => StatusCode::CONFLICT,
            EstimateError::CatalogUnavailable(_)
            | EstimateError::Upstream(_)
            | EstimateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, EstimateError>;

/// Nightly rate and multiplier an estimate is priced with.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pricing {
    base_rate: Option<f64>,
    multiplier: f64,
}

/// Whole cents of a quoted total, as payment providers charge it.
pub fn total_in_cents(total: f64) -> i64 {
    (total * 100.0).round() as i64
}

pub struct EstimateUseCase<E, B, P, K, U, C, V>
where
    E: EstimateRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
    V: PaymentVerifier + Send + Sync + 'static,
{
    estimate_repo: Arc<E>,
    booking_repo: Arc<B>,
    post_repo: Arc<P>,
    package_repo: Arc<K>,
    commerce: Arc<C>,
    entitlements: EntitlementResolver<U, C>,
    payment_verifier: Arc<V>,
    defaults: CatalogDefaults,
}

impl<E, B, P, K, U, C, V> EstimateUseCase<E, B, P, K, U, C, V>
where
    E: EstimateRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
    V: PaymentVerifier + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        estimate_repo: Arc<E>,
        booking_repo: Arc<B>,
        post_repo: Arc<P>,
        package_repo: Arc<K>,
        user_repo: Arc<U>,
        commerce: Arc<C>,
        payment_verifier: Arc<V>,
        defaults: CatalogDefaults,
    ) -> Self {
        Self {
            estimate_repo,
            booking_repo,
            post_repo,
            package_repo,
            entitlements: EntitlementResolver::new(user_repo, Arc::clone(&commerce)),
            commerce,
            payment_verifier,
            defaults,
        }
    }

    /// Re-quotes the caller's latest unpaid estimate for the post, or opens a new one.
    pub async fn upsert(
        &self,
        principal: &Principal,
        model: UpsertEstimateModel,
    ) -> UseCaseResult<EstimateDto> {
        if !admin_or_customer(Some(principal)) {
            return Err(EstimateError::CustomerRequired);
        }

        let stay =
            StayRange::new(model.from_date, model.to_date).ok_or(EstimateError::InvalidStay)?;
        let package_type = model
            .package_type
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let post = self.load_post(model.post_id).await?;
        let customer_id = principal.user_id;
        let pricing = self
            .pricing(&post, package_type.as_deref(), &stay, customer_id)
            .await?;
        let total = stay_total(pricing.base_rate, &stay, pricing.multiplier);

        let latest = self
            .estimate_repo
            .find_latest(customer_id, post.id)
            .await
            .map_err(|err| {
                error!(%customer_id, post_id = %post.id, db_error = ?err, "estimates: failed to load latest estimate");
                EstimateError::Internal(err)
            })?;

        let estimate = match latest {
            Some(estimate) if estimate.payment_status == PaymentStatus::Unpaid => {
                let estimate = self
                    .estimate_repo
                    .requote(
                        estimate.id,
                        RequoteEstimateEntity {
                            guests: guests_to_json(&model.guests),
                            from_date: stay.from_date,
                            to_date: stay.to_date,
                            total: Some(total),
                            package_type,
                            updated_at: Utc::now(),
                        },
                    )
                    .await?;
                info!(estimate_id = %estimate.id, %customer_id, total, "estimates: estimate re-quoted");
                estimate
            }
            _ => {
                let estimate = self
                    .estimate_repo
                    .create(InsertEstimateEntity {
                        post_id: post.id,
                        customer_id,
                        guests: guests_to_json(&model.guests),
                        from_date: stay.from_date,
                        to_date: stay.to_date,
                        total: Some(total),
                        package_type,
                        payment_status: PaymentStatus::Unpaid.to_string(),
                        status: EstimateStatus::Quoted.to_string(),
                    })
                    .await?;
                info!(estimate_id = %estimate.id, %customer_id, total, "estimates: estimate created");
                estimate
            }
        };

        Ok(EstimateDto::from(estimate))
    }

    /// Latest estimate of the caller for a post. A missing, zero or NaN total is recomputed
    /// and written back; a usable total is returned without touching the store.
    pub async fn latest(&self, principal: &Principal, post_id: Uuid) -> UseCaseResult<EstimateDto> {
        let customer_id = principal.user_id;
        let mut estimate = self
            .estimate_repo
            .find_latest(customer_id, post_id)
            .await?
            .ok_or(EstimateError::EstimateNotFound)?;

        if !estimate.has_usable_total() {
            let post = self.load_post(estimate.post_id).await?;
            let total = self.recompute_total(&estimate, &post).await?;
            self.estimate_repo
                .update_total(estimate.id, total)
                .await
                .map_err(|err| {
                    error!(estimate_id = %estimate.id, db_error = ?err, "estimates: failed to persist corrected total");
                    EstimateError::Internal(err)
                })?;
            warn!(
                estimate_id = %estimate.id,
                stored_total = ?estimate.total,
                total,
                "estimates: corrected stored total"
            );
            estimate.total = Some(total);
        }

        Ok(EstimateDto::from(estimate))
    }

    /// Marks the estimate paid only after the payment provider confirms that the checkout
    /// was paid for this estimate and its total, then records the resulting booking.
    pub async fn confirm(
        &self,
        principal: &Principal,
        estimate_id: Uuid,
        model: ConfirmEstimateModel,
    ) -> UseCaseResult<ConfirmedEstimateDto> {
        let estimate = self
            .estimate_repo
            .find_by_id(estimate_id)
            .await?
            .filter(|estimate| permits(&admin_or_self("customer")(Some(principal)), estimate))
            .ok_or(EstimateError::EstimateNotFound)?;

        if !model.payment_validated {
            return Err(EstimateError::PaymentNotValidated);
        }
        if estimate.payment_status == PaymentStatus::Paid {
            return Err(EstimateError::AlreadyPaid);
        }

        let checkout_id = model.checkout_id.trim();
        if checkout_id.is_empty() {
            return Err(EstimateError::MissingCheckout);
        }

        let claimed = self
            .estimate_repo
            .find_by_checkout_id(checkout_id)
            .await
            .map_err(|err| {
                error!(%estimate_id, checkout_id, db_error = ?err, "estimates: failed to look up checkout usage");
                EstimateError::Internal(err)
            })?;
        if claimed.is_some_and(|other| other.id != estimate_id) {
            warn!(%estimate_id, checkout_id, "estimates: confirmation rejected, checkout already used");
            return Err(EstimateError::CheckoutReused);
        }

        let post = self.load_post(estimate.post_id).await?;
        let total = match estimate.total {
            Some(total) if estimate.has_usable_total() => total,
            _ => self.recompute_total(&estimate, &post).await?,
        };

        let checkout = self
            .payment_verifier
            .checkout_state(checkout_id)
            .await
            .map_err(|err| {
                error!(%estimate_id, checkout_id, error = ?err, "estimates: checkout lookup failed");
                EstimateError::Upstream(err)
            })?;
        if !checkout.paid {
            warn!(
                %estimate_id,
                checkout_id,
                status = %checkout.status,
                "estimates: confirmation rejected, checkout not paid"
            );
            return Err(EstimateError::PaymentIncomplete(checkout.status));
        }
        if let Err(reason) = checkout_matches(&checkout, estimate_id, total) {
            warn!(
                %estimate_id,
                checkout_id,
                amount_cents = ?checkout.amount_cents,
                currency = ?checkout.currency,
                reason = %reason,
                "estimates: confirmation rejected, checkout mismatch"
            );
            return Err(EstimateError::CheckoutMismatch(reason));
        }

        let estimate = self
            .estimate_repo
            .mark_paid(estimate_id, checkout_id.to_string())
            .await
            .map_err(|err| {
                error!(%estimate_id, db_error = ?err, "estimates: failed to mark estimate paid");
                EstimateError::Internal(err)
            })?;

        let booking = match self.booking_repo.find_by_estimate_id(estimate_id).await? {
            Some(booking) => booking,
            None => {
                self.booking_repo
                    .create(InsertBookingEntity {
                        post_id: estimate.post_id,
                        customer_id: estimate.customer_id,
                        estimate_id: Some(estimate.id),
                        guests: guests_to_json(&estimate.guests),
                        from_date: estimate.from_date,
                        to_date: estimate.to_date,
                        payment_status: PaymentStatus::Paid.to_string(),
                        token: random_token(),
                        title: post.title.clone(),
                    })
                    .await?
            }
        };

        info!(
            %estimate_id,
            booking_id = %booking.id,
            customer_id = %estimate.customer_id,
            "estimates: estimate confirmed"
        );
        Ok(ConfirmedEstimateDto {
            estimate: EstimateDto::from(estimate),
            booking: BookingDto::from(booking),
        })
    }

    async fn recompute_total(&self, estimate: &EstimateEntity, post: &PostEntity) -> UseCaseResult<f64> {
        let stay = StayRange::new(estimate.from_date, estimate.to_date)
            .ok_or(EstimateError::InvalidStay)?;
        let pricing = match self
            .pricing(post, estimate.package_type.as_deref(), &stay, estimate.customer_id)
            .await
        {
            Ok(pricing) => pricing,
            Err(EstimateError::UnknownPackage(key)) => {
                warn!(estimate_id = %estimate.id, package_type = %key, "estimates: stored package is no longer offered");
                Pricing {
                    base_rate: post.base_rate,
                    multiplier: 1.0,
                }
            }
            Err(err) => return Err(err),
        };

        Ok(stay_total(pricing.base_rate, &stay, pricing.multiplier))
    }

    /// Prices with the offer the customer would see in the package list for this stay. A key
    /// that is not among those offers is rejected.
    async fn pricing(
        &self,
        post: &PostEntity,
        package_type: Option<&str>,
        stay: &StayRange,
        customer_id: Uuid,
    ) -> UseCaseResult<Pricing> {
        let Some(key) = package_type else {
            return Ok(Pricing {
                base_rate: post.base_rate,
                multiplier: 1.0,
            });
        };

        let (local, external, tier) = tokio::join!(
            self.package_repo.list_for_post(post.id, None, true),
            self.commerce.list_products(),
            self.customer_tier(customer_id),
        );

        let local = local.map_err(|err| {
            error!(post_id = %post.id, db_error = ?err, "estimates: failed to load local packages");
            EstimateError::Internal(err)
        })?;
        let (external, catalog_error) = match external {
            Ok(products) => (products, None),
            Err(err) => {
                warn!(post_id = %post.id, error = ?err, "estimates: commerce products unavailable");
                (Vec::new(), Some(err))
            }
        };

        let merged = merge_offers(local, external, &post.package_settings, &self.defaults);
        let offer = visible_offers(
            merged,
            &OfferFilter {
                nights: Some(stay.nights()),
                tier,
                category: None,
            },
        )
        .into_iter()
        .find(|offer| offer.key == key);

        match (offer, catalog_error) {
            (Some(offer), _) => Ok(Pricing {
                base_rate: offer.base_rate.or(post.base_rate),
                multiplier: offer.multiplier,
            }),
            (None, Some(err)) if Uuid::parse_str(key).is_err() => {
                Err(EstimateError::CatalogUnavailable(err))
            }
            (None, _) => {
                warn!(post_id = %post.id, package_type = %key, %tier, "estimates: package not offered to customer");
                Err(EstimateError::UnknownPackage(key.to_string()))
            }
        }
    }

    async fn customer_tier(&self, customer_id: Uuid) -> EntitlementTier {
        self.entitlements
            .resolve_for_user(customer_id)
            .await
            .unwrap_or_else(|err| {
                warn!(
                    %customer_id,
                    error = ?err,
                    "estimates: entitlement resolution failed, treating as none"
                );
                EntitlementTier::None
            })
    }

    async fn load_post(&self, post_id: Uuid) -> UseCaseResult<PostEntity> {
        self.post_repo
            .find_by_id(post_id)
            .await
            .map_err(|err| {
                error!(%post_id, db_error = ?err, "estimates: failed to load post");
                EstimateError::Internal(err)
            })?
            .ok_or(EstimateError::PostNotFound)
    }
}

/// The checkout must have been opened for this estimate and charge its total.
fn checkout_matches(
    checkout: &CheckoutState,
    estimate_id: Uuid,
    total: f64,
) -> std::result::Result<(), String> {
    let estimate_key = estimate_id.to_string();
    if checkout.estimate_id.as_deref() != Some(estimate_key.as_str()) {
        return Err("checkout was opened for a different estimate".to_string());
    }

    let expected = total_in_cents(total);
    if checkout.amount_cents != Some(expected) {
        return Err(format!(
            "amount {:?} does not match expected {expected}",
            checkout.amount_cents
        ));
    }

    if !checkout
        .currency
        .as_deref()
        .is_some_and(|currency| currency.eq_ignore_ascii_case(CHECKOUT_CURRENCY))
    {
        return Err(format!("currency {:?} is not {CHECKOUT_CURRENCY}", checkout.currency));
    }

    Ok(())
}
