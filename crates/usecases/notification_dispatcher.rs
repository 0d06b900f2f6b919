use std::{collections::HashSet, sync::Arc};

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        clock::Clock,
        entities::{
            notifications::{InsertNotificationEntity, NotificationEntity},
            users::UserEntity,
        },
        repositories::{notifications::NotificationRepository, recipients::RecipientDirectory},
        value_objects::{
            enums::{audiences::Audience, notification_types::NotificationType},
            events::{DomainEvent, EventRoute},
            notifications::{NotificationPayload, PushMessage, Recipient},
        },
    },
    usecases::{
        duplicate_suppression::DuplicateSuppression, notification_messages::render,
        push_notifier::PushNotifier,
    },
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no {audience} recipient found for user {user_id}")]
    RecipientUnresolvable { audience: Audience, user_id: Uuid },
    #[error("failed to deliver {notification_type} about {entity_id} to {recipient_id}")]
    DeliveryFailure {
        recipient_id: Uuid,
        notification_type: NotificationType,
        entity_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub recipients: usize,
    pub created: usize,
    pub suppressed: usize,
    pub failed: usize,
}

enum Delivery {
    Created(NotificationEntity),
    Suppressed,
}

pub struct NotificationDispatcher {
    directory: Arc<dyn RecipientDirectory + Send + Sync>,
    notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
    suppression: Arc<DuplicateSuppression>,
    clock: Arc<dyn Clock>,
    push_notifier: Option<PushNotifier>,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn RecipientDirectory + Send + Sync>,
        notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
        suppression: Arc<DuplicateSuppression>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            notification_repo,
            suppression,
            clock,
            push_notifier: None,
        }
    }

    pub fn with_push_notifier(mut self, push_notifier: PushNotifier) -> Self {
        self.push_notifier = Some(push_notifier);
        self
    }

    /// Fans `event` out to every recipient its route selects. Per-recipient
    /// failures are logged and counted, never propagated; only an unknown
    /// subject member aborts the dispatch.
    pub async fn dispatch(&self, event: &DomainEvent) -> Result<DispatchReport, DispatchError> {
        let route = event.route();
        let recipients = self.resolve_recipients(&route).await?;
        let member_name = recipients
            .first()
            .map(|recipient| recipient.user.name.clone())
            .unwrap_or_default();

        let deliveries = recipients
            .iter()
            .map(|recipient| self.deliver(event, &route, recipient, &member_name));
        let results = join_all(deliveries).await;

        let mut report = DispatchReport {
            recipients: recipients.len(),
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(Delivery::Created(_)) => report.created += 1,
                Ok(Delivery::Suppressed) => report.suppressed += 1,
                Err(err) => {
                    report.failed += 1;
                    error!(error = %err, cause = ?err, "dispatch: delivery failed");
                }
            }
        }

        info!(
            notification_type = %route.notification_type,
            entity_type = %route.entity.entity_type,
            entity_id = %route.entity.id,
            recipients = report.recipients,
            created = report.created,
            suppressed = report.suppressed,
            failed = report.failed,
            "dispatch: event fanned out"
        );

        Ok(report)
    }

    // Member first, then trainer, then admins; a user id is only kept under
    // the first audience it appears with.
    async fn resolve_recipients(&self, route: &EventRoute) -> Result<Vec<Recipient>, DispatchError> {
        let member = self
            .directory
            .find_user(route.subject_user_id)
            .await
            .map_err(|err| {
                error!(
                    user_id = %route.subject_user_id,
                    db_error = ?err,
                    "dispatch: failed to load member"
                );
                DispatchError::Internal(err)
            })?
            .ok_or(DispatchError::RecipientUnresolvable {
                audience: Audience::Member,
                user_id: route.subject_user_id,
            })?;

        let mut seen = HashSet::from([member.id]);
        let mut recipients = vec![Recipient {
            user: member,
            audience: Audience::Member,
        }];

        if route.include_trainer {
            match self
                .directory
                .find_assigned_trainer(route.subject_user_id)
                .await
            {
                Ok(Some(trainer)) => push_unique(&mut recipients, &mut seen, trainer, Audience::Trainer),
                Ok(None) => debug!(
                    user_id = %route.subject_user_id,
                    "dispatch: member has no assigned trainer"
                ),
                Err(err) => {
                    let skipped = DispatchError::RecipientUnresolvable {
                        audience: Audience::Trainer,
                        user_id: route.subject_user_id,
                    };
                    warn!(error = %skipped, db_error = ?err, "dispatch: skipping trainer");
                }
            }
        }

        if route.include_admins {
            match self.directory.list_admins().await {
                Ok(admins) => {
                    for admin in admins {
                        push_unique(&mut recipients, &mut seen, admin, Audience::Admin);
                    }
                }
                Err(err) => {
                    let skipped = DispatchError::RecipientUnresolvable {
                        audience: Audience::Admin,
                        user_id: route.subject_user_id,
                    };
                    warn!(error = %skipped, db_error = ?err, "dispatch: skipping admins");
                }
            }
        }

        Ok(recipients)
    }

    async fn deliver(
        &self,
        event: &DomainEvent,
        route: &EventRoute,
        recipient: &Recipient,
        member_name: &str,
    ) -> Result<Delivery, DispatchError> {
        let recipient_id = recipient.user.id;
        let notification_type = route.notification_type;
        let entity_id = route.entity.id;

        if self
            .suppression
            .should_suppress_for(recipient_id, notification_type, entity_id)
            .await
        {
            debug!(
                %recipient_id,
                %notification_type,
                %entity_id,
                "dispatch: duplicate suppressed"
            );
            return Ok(Delivery::Suppressed);
        }

        let failure = |source: anyhow::Error| DispatchError::DeliveryFailure {
            recipient_id,
            notification_type,
            entity_id,
            source,
        };

        let rendered = render(event, recipient.audience, member_name);
        let payload = serde_json::to_value(NotificationPayload {
            event: notification_type,
            audience: recipient.audience,
            entity_type: route.entity.entity_type,
            entity_id,
            subject_user_id: route.subject_user_id,
        })
        .map_err(|err| failure(err.into()))?;

        let notification = self
            .notification_repo
            .insert(InsertNotificationEntity {
                recipient_id,
                notification_type: notification_type.to_string(),
                audience: recipient.audience.to_string(),
                title: rendered.title,
                message: rendered.message,
                link: rendered.link,
                entity_type: route.entity.entity_type.to_string(),
                entity_id,
                payload,
                created_at: self.clock.now(),
            })
            .await
            .map_err(failure)?;

        if let Some(push_notifier) = &self.push_notifier {
            push_notifier.try_notify(PushMessage::from(&notification));
        }

        Ok(Delivery::Created(notification))
    }
}

fn push_unique(
    recipients: &mut Vec<Recipient>,
    seen: &mut HashSet<Uuid>,
    user: UserEntity,
    audience: Audience,
) {
    if seen.insert(user.id) {
        recipients.push(Recipient { user, audience });
    }
}
