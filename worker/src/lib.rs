pub mod axum_http;
pub mod config;
pub mod event_dispatching;
pub mod expiration_sweeping;
