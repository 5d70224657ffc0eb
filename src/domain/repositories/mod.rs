pub mod bookings;
pub mod estimates;
pub mod packages;
pub mod posts;
pub mod users;
