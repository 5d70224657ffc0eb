pub mod auth;
pub mod bookings;
pub mod entitlements;
pub mod estimates;
pub mod package_suggestions;
pub mod packages;
pub mod posts;
pub mod users;
