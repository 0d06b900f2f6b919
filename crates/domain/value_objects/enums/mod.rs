pub mod assigned_plan_kinds;
pub mod audiences;
pub mod duration_types;
pub mod entity_types;
pub mod notification_types;
pub mod payment_gateways;
pub mod subscription_statuses;
pub mod user_roles;
