pub mod duplicate_suppression;
pub mod event_bus;
pub mod expiration_backfill;
pub mod expiration_sweep;
pub mod notification_dispatcher;
pub mod notification_inbox;
pub mod notification_messages;
pub mod push_notifier;
pub mod subscription_lifecycle;
