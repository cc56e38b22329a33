pub mod admin_api;
pub mod api;
pub mod auth;
pub mod public;
