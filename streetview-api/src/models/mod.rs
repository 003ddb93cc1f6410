pub mod auth;
pub mod places;
pub mod publish;
