pub mod axum_http;
pub mod mailer;
pub mod postgres;
pub mod revenue_cat;
pub mod text_generation;
pub mod yoco;
