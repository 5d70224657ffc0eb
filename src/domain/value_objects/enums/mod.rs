pub mod entitlement_tiers;
pub mod estimate_statuses;
pub mod package_categories;
pub mod payment_statuses;
pub mod post_statuses;
pub mod product_periods;
pub mod roles;
pub mod subscription_statuses;
