use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::automock;

#[automock]
#[async_trait]
pub trait JobLeaseRepository {
    /// Takes the named lease for `ttl` if nobody holds an unexpired one.
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool>;

    async fn release(&self, name: &str, holder: &str) -> Result<()>;
}
