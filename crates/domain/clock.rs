use chrono::{DateTime, Utc};

/// Source of "now". Sweeps, suppression windows and lifecycle stamps all read
/// time through this so they can be driven from a fixed instant in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
