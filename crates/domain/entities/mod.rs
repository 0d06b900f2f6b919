pub mod job_leases;
pub mod notifications;
pub mod plans;
pub mod subscriptions;
pub mod users;
