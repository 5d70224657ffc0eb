pub mod access;
pub mod bookings;
pub mod enums;
pub mod magic_links;
pub mod offers;
pub mod packages;
pub mod posts;
pub mod stays;
pub mod suggestions;
pub mod users;
