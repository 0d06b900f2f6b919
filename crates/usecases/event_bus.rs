use anyhow::{Result, anyhow};
use async_trait::async_trait;
use mockall::automock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::value_objects::events::DomainEvent;

/// Hands domain events to whatever fans them out.
#[automock]
#[async_trait]
pub trait EventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<()>;
}

/// In-process bounded queue between event producers and the dispatcher loop.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<DomainEvent>,
}

pub struct EventReceiver {
    rx: mpsc::Receiver<DomainEvent>,
}

impl EventBus {
    pub fn channel(capacity: usize) -> (EventBus, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (EventBus { tx }, EventReceiver { rx })
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        let notification_type = event.notification_type();
        self.tx
            .send(event)
            .await
            .map_err(|_| anyhow!("event bus closed; dropped {notification_type} event"))?;

        debug!(%notification_type, "event bus: event queued");
        Ok(())
    }
}

impl EventReceiver {
    /// `None` once every `EventBus` handle has been dropped and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.rx.recv().await
    }
}
