use std::sync::Arc;

use anyhow::Result;
use memberhub::usecases::{
    event_bus::EventReceiver,
    notification_dispatcher::{DispatchError, NotificationDispatcher},
};
use tracing::{error, info, warn};

/// Drains the event queue one event at a time. Returns once every publisher
/// handle is gone.
pub async fn run(dispatcher: Arc<NotificationDispatcher>, mut events: EventReceiver) -> Result<()> {
    info!("event_dispatch: starting worker loop");

    while let Some(event) = events.recv().await {
        let notification_type = event.notification_type();
        match dispatcher.dispatch(&event).await {
            Ok(_) => {}
            Err(err @ DispatchError::RecipientUnresolvable { .. }) => {
                warn!(
                    %notification_type,
                    error = %err,
                    "event_dispatch: dropping event"
                );
            }
            Err(err) => {
                error!(
                    %notification_type,
                    error = %err,
                    cause = ?err,
                    "event_dispatch: dispatch failed"
                );
            }
        }
    }

    info!("event_dispatch: event queue closed");
    Ok(())
}
