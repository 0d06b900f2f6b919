pub mod job_leases;
pub mod notifications;
pub mod plans;
pub mod recipients;
pub mod subscriptions;
