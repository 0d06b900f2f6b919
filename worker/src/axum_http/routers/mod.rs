pub mod events;
pub mod notifications;
pub mod subscriptions;
