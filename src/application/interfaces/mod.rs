pub mod commerce;
pub mod mailer;
pub mod payments;
pub mod text_generation;
