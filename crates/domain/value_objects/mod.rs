pub mod enums;
pub mod events;
pub mod notifications;
pub mod subscriptions;
pub mod suppression;
