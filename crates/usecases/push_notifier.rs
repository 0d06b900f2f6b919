use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::{
    repositories::push_providers::PushProvider, value_objects::notifications::PushMessage,
};

const PUSH_QUEUE_CAPACITY: usize = 256;

/// Best-effort out-of-band delivery. The stored notification is the source of
/// truth; a dropped or failed push never surfaces to the dispatcher.
#[derive(Clone)]
pub struct PushNotifier {
    tx: mpsc::Sender<PushMessage>,
}

impl PushNotifier {
    pub fn new(providers: Vec<Arc<dyn PushProvider>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<PushMessage>(PUSH_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                for provider in &providers {
                    match provider.send(&message).await {
                        Ok(()) => debug!(
                            provider = provider.provider_name(),
                            notification_id = %message.notification_id,
                            "push delivered"
                        ),
                        Err(error) => warn!(
                            provider = provider.provider_name(),
                            notification_id = %message.notification_id,
                            error = %error,
                            "Push provider failed"
                        ),
                    }
                }
            }
        });

        Self { tx }
    }

    pub fn try_notify(&self, message: PushMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                warn!(
                    notification_id = %message.notification_id,
                    "Push queue full; dropping message"
                );
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                warn!(
                    notification_id = %message.notification_id,
                    "Push queue closed; dropping message"
                );
            }
        }
    }
}
