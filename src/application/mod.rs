pub mod access_control;
pub mod interfaces;
pub mod usecases;
