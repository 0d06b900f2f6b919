use anyhow::Result;
use async_trait::async_trait;

use crate::domain::value_objects::notifications::PushMessage;

/// Out-of-band delivery of an already persisted notification.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}
