use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        access_control::can_manage_post,
        interfaces::commerce::CommerceCatalog,
        usecases::{entitlements::EntitlementResolver, posts::can_view_post},
    },
    domain::{
        entities::{
            packages::{EditPackageEntity, InsertPackageEntity},
            posts::PostEntity,
        },
        repositories::{packages::PackageRepository, posts::PostRepository, users::UserRepository},
        value_objects::{
            access::Principal,
            enums::{entitlement_tiers::EntitlementTier, package_categories::PackageCategory},
            offers::{
                CatalogDefaults, ExternalProduct, OfferFilter, PricedOffer, merge_offers,
                price_offer, visible_offers,
            },
            packages::{
                BulkDeleteOutcome, BulkDeletePackagesModel, CreatePackageModel, FailedDeletion,
                PackageDto, PackageListQuery, PackageSetting, PackageSettingsModel, SyncOutcome,
                UpdatePackageModel,
            },
        },
    },
};

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("post not found")]
    PostNotFound,
    #[error("package not found")]
    PackageNotFound,
    #[error("authentication required")]
    Unauthenticated,
    #[error("not allowed to manage packages of this post")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("commerce catalog unavailable: {0}")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PackageError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PackageError::PostNotFound | PackageError::PackageNotFound => StatusCode::NOT_FOUND,
            PackageError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PackageError::Forbidden => StatusCode::FORBIDDEN,
            PackageError::Validation(_) => StatusCode::BAD_REQUEST,
            PackageError::Conflict(_) => StatusCode::CONFLICT,
            PackageError::Upstream(_) | PackageError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PackageError>;

pub struct PackageUseCase<P, K, U, C>
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    post_repo: Arc<P>,
    package_repo: Arc<K>,
    commerce: Arc<C>,
    entitlements: EntitlementResolver<U, C>,
    defaults: CatalogDefaults,
}

impl<P, K, U, C> PackageUseCase<P, K, U, C>
where
    P: PostRepository + Send + Sync + 'static,
    K: PackageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CommerceCatalog + Send + Sync + 'static,
{
    pub fn new(
        post_repo: Arc<P>,
        package_repo: Arc<K>,
        user_repo: Arc<U>,
        commerce: Arc<C>,
        defaults: CatalogDefaults,
    ) -> Self {
        Self {
            post_repo,
            package_repo,
            entitlements: EntitlementResolver::new(user_repo, Arc::clone(&commerce)),
            commerce,
            defaults,
        }
    }

    /// Merged, filtered and priced offers of a post for the calling principal.
    pub async fn list_offers(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
        query: PackageListQuery,
    ) -> UseCaseResult<Vec<PricedOffer>> {
        if matches!(query.nights, Some(nights) if nights < 1) {
            return Err(PackageError::Validation(
                "nights must be at least 1".to_string(),
            ));
        }

        let post = self.load_post(post_id).await?;
        if !can_view_post(principal, &post) {
            return Err(PackageError::PostNotFound);
        }

        let (local, external, tier) = tokio::join!(
            self.package_repo
                .list_for_post(post_id, query.category, true),
            self.commerce.list_products(),
            self.principal_tier(principal),
        );

        let local = local.map_err(|err| {
            error!(%post_id, db_error = ?err, "packages: failed to load local packages");
            PackageError::Internal(err)
        })?;
        let external = external.map_err(|err| {
            error!(%post_id, error = ?err, "packages: failed to load commerce products");
            PackageError::Upstream(err)
        })?;

        let merged = merge_offers(local, external, &post.package_settings, &self.defaults);
        let offers = visible_offers(
            merged,
            &OfferFilter {
                nights: query.nights,
                tier,
                category: query.category,
            },
        );

        info!(
            %post_id,
            offer_count = offers.len(),
            %tier,
            nights = ?query.nights,
            "packages: offers listed"
        );

        Ok(offers
            .into_iter()
            .map(|offer| price_offer(offer, post.base_rate, query.nights))
            .collect())
    }

    pub async fn create_package(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
        model: CreatePackageModel,
    ) -> UseCaseResult<PackageDto> {
        self.load_managed_post(principal, post_id).await?;
        model.validate().map_err(PackageError::Validation)?;

        if let Some(revenue_cat_id) = model.revenue_cat_id.as_deref() {
            let existing = self
                .package_repo
                .find_by_revenue_cat_id(post_id, revenue_cat_id)
                .await?;
            if existing.is_some() {
                return Err(PackageError::Conflict(format!(
                    "a package linked to {revenue_cat_id} already exists"
                )));
            }
        }

        let package = self
            .package_repo
            .create(model.to_entity(post_id))
            .await
            .map_err(|err| {
                error!(%post_id, db_error = ?err, "packages: failed to create package");
                PackageError::Internal(err)
            })?;

        info!(%post_id, package_id = %package.id, "packages: package created");
        Ok(PackageDto::from(package))
    }

    pub async fn update_package(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
        package_id: Uuid,
        model: UpdatePackageModel,
    ) -> UseCaseResult<PackageDto> {
        self.load_managed_post(principal, post_id).await?;
        model.validate().map_err(PackageError::Validation)?;

        let package = self
            .package_repo
            .find_by_id(package_id)
            .await?
            .filter(|package| package.post_id == post_id)
            .ok_or(PackageError::PackageNotFound)?;

        let min_nights = model.min_nights.unwrap_or(package.min_nights);
        let max_nights = model.max_nights.unwrap_or(package.max_nights);
        if matches!(max_nights, Some(max) if max < min_nights) {
            return Err(PackageError::Validation(
                "max_nights must not be lower than min_nights".to_string(),
            ));
        }

        let package = self
            .package_repo
            .update(package_id, model.to_entity())
            .await
            .map_err(|err| {
                error!(%post_id, %package_id, db_error = ?err, "packages: failed to update package");
                PackageError::Internal(err)
            })?;

        info!(%post_id, %package_id, "packages: package updated");
        Ok(PackageDto::from(package))
    }

    /// Every id is attempted; failures are reported next to the successes.
    pub async fn delete_packages(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
        model: BulkDeletePackagesModel,
    ) -> UseCaseResult<BulkDeleteOutcome> {
        self.load_managed_post(principal, post_id).await?;
        if model.ids.is_empty() {
            return Err(PackageError::Validation("ids must not be empty".to_string()));
        }

        let mut outcome = BulkDeleteOutcome::default();
        for package_id in model.ids {
            match self.package_repo.delete(post_id, package_id).await {
                Ok(true) => outcome.deleted.push(package_id),
                Ok(false) => outcome.failed.push(FailedDeletion {
                    id: package_id,
                    error: "package not found".to_string(),
                }),
                Err(err) => {
                    warn!(%post_id, %package_id, db_error = ?err, "packages: failed to delete package");
                    outcome.failed.push(FailedDeletion {
                        id: package_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            %post_id,
            deleted = outcome.deleted.len(),
            failed = outcome.failed.len(),
            "packages: bulk delete finished"
        );
        Ok(outcome)
    }

    pub async fn replace_settings(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
        model: PackageSettingsModel,
    ) -> UseCaseResult<Vec<PackageSetting>> {
        self.load_managed_post(principal, post_id).await?;

        let mut settings: Vec<PackageSetting> = Vec::with_capacity(model.settings.len());
        for mut setting in model.settings {
            setting.package_key = setting.package_key.trim().to_string();
            if setting.package_key.is_empty() {
                return Err(PackageError::Validation(
                    "packageKey must not be empty".to_string(),
                ));
            }
            match settings
                .iter_mut()
                .find(|existing| existing.package_key == setting.package_key)
            {
                Some(existing) => *existing = setting,
                None => settings.push(setting),
            }
        }

        self.post_repo
            .update_package_settings(post_id, settings.clone())
            .await
            .map_err(|err| {
                error!(%post_id, db_error = ?err, "packages: failed to save package settings");
                PackageError::Internal(err)
            })?;

        info!(%post_id, setting_count = settings.len(), "packages: package settings replaced");
        Ok(settings)
    }

    /// Mirrors every commerce product as a local package of the post. New mirrors start
    /// disabled; existing ones get their catalog fields refreshed.
    pub async fn sync_products(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
    ) -> UseCaseResult<SyncOutcome> {
        self.load_managed_post(principal, post_id).await?;

        let products = self.commerce.list_products().await.map_err(|err| {
            error!(%post_id, error = ?err, "packages: failed to load commerce products for sync");
            PackageError::Upstream(err)
        })?;

        let mut outcome = SyncOutcome::default();
        for product in products {
            let existing = self
                .package_repo
                .find_by_revenue_cat_id(post_id, &product.id)
                .await?;

            match existing {
                Some(package) => {
                    self.package_repo
                        .update(package.id, refreshed_package(&product))
                        .await?;
                    outcome.updated += 1;
                }
                None => {
                    self.package_repo
                        .create(mirrored_package(post_id, &product))
                        .await?;
                    outcome.created += 1;
                }
            }
        }

        info!(
            %post_id,
            created = outcome.created,
            updated = outcome.updated,
            "packages: commerce products synced"
        );
        Ok(outcome)
    }

    async fn principal_tier(&self, principal: Option<&Principal>) -> EntitlementTier {
        let Some(principal) = principal else {
            return EntitlementTier::None;
        };

        self.entitlements
            .resolve_for_user(principal.user_id)
            .await
            .unwrap_or_else(|err| {
                warn!(
                    user_id = %principal.user_id,
                    error = ?err,
                    "packages: entitlement resolution failed, treating as none"
                );
                EntitlementTier::None
            })
    }

    async fn load_post(&self, post_id: Uuid) -> UseCaseResult<PostEntity> {
        self.post_repo
            .find_by_id(post_id)
            .await
            .map_err(|err| {
                error!(%post_id, db_error = ?err, "packages: failed to load post");
                PackageError::Internal(err)
            })?
            .ok_or(PackageError::PostNotFound)
    }

    /// 401 for anonymous callers, 403 unless admin or the owning host.
    async fn load_managed_post(
        &self,
        principal: Option<&Principal>,
        post_id: Uuid,
    ) -> UseCaseResult<PostEntity> {
        let Some(actor) = principal else {
            return Err(PackageError::Unauthenticated);
        };

        let post = self.load_post(post_id).await?;
        if !can_manage_post(principal, &post) {
            warn!(user_id = %actor.user_id, %post_id, "packages: package management rejected");
            return Err(PackageError::Forbidden);
        }

        Ok(post)
    }
}

fn mirrored_package(post_id: Uuid, product: &ExternalProduct) -> InsertPackageEntity {
    InsertPackageEntity {
        post_id,
        name: product.title.clone(),
        description: product.description.clone(),
        multiplier: 1.0,
        category: PackageCategory::Standard.to_string(),
        min_nights: product.nights(),
        max_nights: None,
        entitlement_required: product.entitlement.to_string(),
        is_enabled: false,
        revenue_cat_id: Some(product.id.clone()),
        base_rate: product.nightly_rate(),
    }
}

fn refreshed_package(product: &ExternalProduct) -> EditPackageEntity {
    EditPackageEntity {
        name: Some(product.title.clone()),
        description: Some(product.description.clone()),
        min_nights: Some(product.nights()),
        entitlement_required: Some(product.entitlement.to_string()),
        base_rate: Some(product.nightly_rate()),
        updated_at: Some(Utc::now()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::packages::PackageEntity,
        repositories::{
            packages::MockPackageRepository, posts::MockPostRepository,
            users::MockUserRepository,
        },
        value_objects::enums::{
            post_statuses::PostStatus,
            product_periods::ProductPeriod,
            roles::{Role, RoleSet},
        },
    };
    use crate::application::interfaces::commerce::MockCommerceCatalog;
    use anyhow::anyhow;
    use mockall::predicate::eq;

    type TestUseCase = PackageUseCase<
        MockPostRepository,
        MockPackageRepository,
        MockUserRepository,
        MockCommerceCatalog,
    >;

    fn sample_post(owner_id: Option<Uuid>) -> PostEntity {
        let now = Utc::now();
        PostEntity {
            id: Uuid::new_v4(),
            slug: "beach-house".to_string(),
            title: "Beach house".to_string(),
            description: None,
            owner_id,
            status: PostStatus::Published,
            base_rate: Some(150.0),
            package_settings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_package(post_id: Uuid, name: &str, multiplier: f64) -> PackageEntity {
        let now = Utc::now();
        PackageEntity {
            id: Uuid::new_v4(),
            post_id,
            name: name.to_string(),
            description: None,
            multiplier,
            category: "standard".to_string(),
            min_nights: 1,
            max_nights: None,
            entitlement_required: "none".to_string(),
            is_enabled: true,
            revenue_cat_id: None,
            base_rate: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(id: &str, entitlement: EntitlementTier) -> ExternalProduct {
        ExternalProduct {
            id: id.to_string(),
            title: "Weekly".to_string(),
            description: None,
            price: Some(700.0),
            period: Some(ProductPeriod::Week),
            period_count: 1,
            entitlement,
            features: Vec::new(),
        }
    }

    fn principal(user_id: Uuid, roles: &[Role]) -> Principal {
        Principal {
            user_id,
            email: "someone@example.com".to_string(),
            roles: RoleSet::new(roles.iter().copied()),
        }
    }

    fn usecase(
        post_repo: MockPostRepository,
        package_repo: MockPackageRepository,
        user_repo: MockUserRepository,
        commerce: MockCommerceCatalog,
    ) -> TestUseCase {
        PackageUseCase::new(
            Arc::new(post_repo),
            Arc::new(package_repo),
            Arc::new(user_repo),
            Arc::new(commerce),
            CatalogDefaults::default(),
        )
    }

    fn post_repo_with(post: PostEntity) -> MockPostRepository {
        let mut post_repo = MockPostRepository::new();
        post_repo
            .expect_find_by_id()
            .with(eq(post.id))
            .returning(move |_| Ok(Some(post.clone())));
        post_repo
    }

    #[tokio::test]
    async fn anonymous_listing_prices_enabled_local_packages_only() {
        let mut post = sample_post(None);
        let post_id = post.id;
        let discounted = sample_package(post_id, "Discounted", 0.9);
        post.package_settings = vec![PackageSetting {
            package_key: "weekly".to_string(),
            custom_name: None,
            enabled: Some(true),
        }];

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_list_for_post()
            .with(eq(post_id), eq(None::<PackageCategory>), eq(true))
            .returning(move |_, _, _| Ok(vec![discounted.clone()]));

        let mut commerce = MockCommerceCatalog::new();
        commerce.expect_list_products().returning(|| {
            Ok(vec![
                product("weekly", EntitlementTier::Standard),
                product("unlisted", EntitlementTier::None),
            ])
        });
        commerce.expect_customer_entitlement().never();

        let offers = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            commerce,
        )
        .list_offers(
            None,
            post_id,
            PackageListQuery {
                category: None,
                nights: Some(3),
            },
        )
        .await
        .unwrap();

        // "weekly" needs a standard entitlement and seven nights; "unlisted" has no override.
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].offer.name, "Discounted");
        assert!((offers[0].total.unwrap() - 405.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn subscriber_sees_entitled_external_offer() {
        let mut post = sample_post(None);
        let post_id = post.id;
        post.package_settings = vec![PackageSetting {
            package_key: "weekly".to_string(),
            custom_name: Some("Week by the sea".to_string()),
            enabled: Some(true),
        }];
        let user_id = Uuid::new_v4();

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_list_for_post()
            .returning(|_, _, _| Ok(Vec::new()));

        let mut commerce = MockCommerceCatalog::new();
        commerce
            .expect_list_products()
            .returning(|| Ok(vec![product("weekly", EntitlementTier::Standard)]));
        commerce
            .expect_customer_entitlement()
            .with(eq(user_id))
            .returning(|_| Ok(EntitlementTier::Pro));

        let offers = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            commerce,
        )
        .list_offers(
            Some(&principal(user_id, &[Role::Customer])),
            post_id,
            PackageListQuery {
                category: None,
                nights: Some(7),
            },
        )
        .await
        .unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].offer.name, "Week by the sea");
        assert!((offers[0].total.unwrap() - 700.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn catalog_failure_is_upstream_error() {
        let post = sample_post(None);
        let post_id = post.id;

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_list_for_post()
            .returning(|_, _, _| Ok(Vec::new()));
        let mut commerce = MockCommerceCatalog::new();
        commerce
            .expect_list_products()
            .returning(|| Err(anyhow!("503 from catalog")));

        let result = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            commerce,
        )
        .list_offers(None, post_id, PackageListQuery::default())
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, PackageError::Upstream(_)));
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn zero_nights_is_rejected() {
        let result = usecase(
            MockPostRepository::new(),
            MockPackageRepository::new(),
            MockUserRepository::new(),
            MockCommerceCatalog::new(),
        )
        .list_offers(
            None,
            Uuid::new_v4(),
            PackageListQuery {
                category: None,
                nights: Some(0),
            },
        )
        .await;

        assert!(matches!(result, Err(PackageError::Validation(_))));
    }

    #[tokio::test]
    async fn management_requires_a_principal_then_ownership() {
        let owner_id = Uuid::new_v4();
        let post = sample_post(Some(owner_id));
        let post_id = post.id;
        let usecase = usecase(
            post_repo_with(post),
            MockPackageRepository::new(),
            MockUserRepository::new(),
            MockCommerceCatalog::new(),
        );

        let anonymous = usecase.sync_products(None, post_id).await;
        let other_host = usecase
            .sync_products(Some(&principal(Uuid::new_v4(), &[Role::Host])), post_id)
            .await;

        assert!(matches!(anonymous, Err(PackageError::Unauthenticated)));
        assert!(matches!(other_host, Err(PackageError::Forbidden)));
    }

    #[tokio::test]
    async fn bulk_delete_collects_per_item_results() {
        let post = sample_post(None);
        let post_id = post.id;
        let deleted = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let broken = Uuid::new_v4();

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_delete()
            .returning(move |_, package_id| {
                if package_id == deleted {
                    Ok(true)
                } else if package_id == missing {
                    Ok(false)
                } else {
                    Err(anyhow!("constraint violation"))
                }
            });

        let outcome = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            MockCommerceCatalog::new(),
        )
        .delete_packages(
            Some(&principal(Uuid::new_v4(), &[Role::Admin])),
            post_id,
            BulkDeletePackagesModel {
                ids: vec![deleted, missing, broken],
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.deleted, vec![deleted]);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].id, missing);
        assert_eq!(outcome.failed[1].error, "constraint violation");
    }

    #[tokio::test]
    async fn sync_creates_disabled_mirrors_and_refreshes_existing() {
        let owner_id = Uuid::new_v4();
        let post = sample_post(Some(owner_id));
        let post_id = post.id;
        let mut linked = sample_package(post_id, "Old weekly", 1.0);
        linked.revenue_cat_id = Some("weekly".to_string());
        let linked_id = linked.id;

        let mut commerce = MockCommerceCatalog::new();
        commerce.expect_list_products().returning(|| {
            Ok(vec![
                product("weekly", EntitlementTier::Standard),
                product("monthly", EntitlementTier::Pro),
            ])
        });

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_find_by_revenue_cat_id()
            .returning(move |_, revenue_cat_id| {
                Ok((revenue_cat_id == "weekly").then(|| linked.clone()))
            });
        package_repo
            .expect_update()
            .withf(move |id, edit| *id == linked_id && edit.name.as_deref() == Some("Weekly"))
            .times(1)
            .returning(move |_, _| Ok(sample_package(post_id, "Weekly", 1.0)));
        package_repo
            .expect_create()
            .withf(|insert| {
                !insert.is_enabled
                    && insert.revenue_cat_id.as_deref() == Some("monthly")
                    && insert.min_nights == 7
                    && insert.base_rate == Some(100.0)
            })
            .times(1)
            .returning(move |_| Ok(sample_package(post_id, "Weekly", 1.0)));

        let outcome = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            commerce,
        )
        .sync_products(Some(&principal(owner_id, &[Role::Host])), post_id)
        .await
        .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome {
                created: 1,
                updated: 1
            }
        );
    }

    #[tokio::test]
    async fn replacing_settings_dedupes_by_key() {
        let post = sample_post(None);
        let post_id = post.id;
        let mut post_repo = post_repo_with(post);
        post_repo
            .expect_update_package_settings()
            .withf(|_, settings| settings.len() == 1 && settings[0].enabled == Some(false))
            .times(1)
            .returning(|_, _| Ok(()));

        let settings = usecase(
            post_repo,
            MockPackageRepository::new(),
            MockUserRepository::new(),
            MockCommerceCatalog::new(),
        )
        .replace_settings(
            Some(&principal(Uuid::new_v4(), &[Role::Admin])),
            post_id,
            PackageSettingsModel {
                settings: vec![
                    PackageSetting {
                        package_key: "weekly".to_string(),
                        custom_name: None,
                        enabled: Some(true),
                    },
                    PackageSetting {
                        package_key: " weekly ".to_string(),
                        custom_name: None,
                        enabled: Some(false),
                    },
                ],
            },
        )
        .await
        .unwrap();

        assert_eq!(settings.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_commerce_link() {
        let post = sample_post(None);
        let post_id = post.id;
        let mut existing = sample_package(post_id, "Weekly", 1.0);
        existing.revenue_cat_id = Some("weekly".to_string());

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_find_by_revenue_cat_id()
            .returning(move |_, _| Ok(Some(existing.clone())));
        package_repo.expect_create().never();

        let model: CreatePackageModel = serde_json::from_value(serde_json::json!({
            "name": "Weekly again",
            "revenue_cat_id": "weekly"
        }))
        .unwrap();

        let result = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            MockCommerceCatalog::new(),
        )
        .create_package(
            Some(&principal(Uuid::new_v4(), &[Role::Admin])),
            post_id,
            model,
        )
        .await;

        assert!(matches!(result, Err(PackageError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_can_clear_max_nights() {
        let post = sample_post(None);
        let post_id = post.id;
        let mut package = sample_package(post_id, "Long stay", 0.9);
        package.min_nights = 7;
        package.max_nights = Some(14);
        let package_id = package.id;
        let stored = package.clone();

        let mut package_repo = MockPackageRepository::new();
        package_repo
            .expect_find_by_id()
            .with(eq(package_id))
            .returning(move |_| Ok(Some(stored.clone())));
        package_repo
            .expect_update()
            .withf(move |id, edit| *id == package_id && edit.max_nights == Some(None))
            .times(1)
            .returning(move |_, _| {
                Ok(PackageEntity {
                    max_nights: None,
                    ..package.clone()
                })
            });

        let model: UpdatePackageModel =
            serde_json::from_value(serde_json::json!({ "max_nights": null })).unwrap();

        let dto = usecase(
            post_repo_with(post),
            package_repo,
            MockUserRepository::new(),
            MockCommerceCatalog::new(),
        )
        .update_package(
            Some(&principal(Uuid::new_v4(), &[Role::Admin])),
            post_id,
            package_id,
            model,
        )
        .await
        .unwrap();

        assert_eq!(dto.max_nights, None);
    }
}
