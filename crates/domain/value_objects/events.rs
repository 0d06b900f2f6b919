use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    assigned_plan_kinds::AssignedPlanKind, entity_types::EntityType,
    notification_types::NotificationType,
};
use crate::domain::value_objects::notifications::EntityRef;

/// Something that happened in the application and may notify people.
///
/// Serialized as `{"event": "<type>", ...fields}` so producers outside the
/// worker can enqueue events over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    MemberRegistered {
        user_id: Uuid,
    },
    SubscriptionCreated {
        subscription_id: Uuid,
        user_id: Uuid,
        plan_name: Option<String>,
    },
    SubscriptionActivated {
        subscription_id: Uuid,
        user_id: Uuid,
        plan_name: Option<String>,
    },
    SubscriptionPastDue {
        subscription_id: Uuid,
        user_id: Uuid,
        plan_name: Option<String>,
    },
    SubscriptionCanceled {
        subscription_id: Uuid,
        user_id: Uuid,
        plan_name: Option<String>,
    },
    SubscriptionExpired {
        subscription_id: Uuid,
        user_id: Uuid,
        plan_name: Option<String>,
    },
    VideoUploaded {
        video_id: Uuid,
        user_id: Uuid,
        title: Option<String>,
    },
    VideoReviewed {
        video_id: Uuid,
        user_id: Uuid,
        approved: bool,
        note: Option<String>,
    },
    PlanAssigned {
        assignment_id: Uuid,
        user_id: Uuid,
        plan_kind: AssignedPlanKind,
        plan_name: Option<String>,
    },
}

/// Who an event notifies and what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRoute {
    pub notification_type: NotificationType,
    pub subject_user_id: Uuid,
    pub entity: EntityRef,
    pub include_admins: bool,
    pub include_trainer: bool,
}

impl DomainEvent {
    pub fn notification_type(&self) -> NotificationType {
        self.route().notification_type
    }

    pub fn subject_user_id(&self) -> Uuid {
        self.route().subject_user_id
    }

    pub fn route(&self) -> EventRoute {
        match self {
            DomainEvent::MemberRegistered { user_id } => EventRoute {
                notification_type: NotificationType::MemberRegistered,
                subject_user_id: *user_id,
                entity: EntityRef::new(EntityType::User, *user_id),
                include_admins: true,
                include_trainer: false,
            },
            DomainEvent::SubscriptionCreated {
                subscription_id,
                user_id,
                ..
            } => subscription_route(
                NotificationType::SubscriptionCreated,
                *subscription_id,
                *user_id,
            ),
            DomainEvent::SubscriptionActivated {
                subscription_id,
                user_id,
                ..
            } => subscription_route(
                NotificationType::SubscriptionActivated,
                *subscription_id,
                *user_id,
            ),
            DomainEvent::SubscriptionPastDue {
                subscription_id,
                user_id,
                ..
            } => subscription_route(
                NotificationType::SubscriptionPastDue,
                *subscription_id,
                *user_id,
            ),
            DomainEvent::SubscriptionCanceled {
                subscription_id,
                user_id,
                ..
            } => subscription_route(
                NotificationType::SubscriptionCanceled,
                *subscription_id,
                *user_id,
            ),
            DomainEvent::SubscriptionExpired {
                subscription_id,
                user_id,
                ..
            } => subscription_route(
                NotificationType::SubscriptionExpired,
                *subscription_id,
                *user_id,
            ),
            DomainEvent::VideoUploaded {
                video_id, user_id, ..
            } => EventRoute {
                notification_type: NotificationType::VideoUploaded,
                subject_user_id: *user_id,
                entity: EntityRef::new(EntityType::Video, *video_id),
                include_admins: true,
                include_trainer: true,
            },
            DomainEvent::VideoReviewed {
                video_id, user_id, ..
            } => EventRoute {
                notification_type: NotificationType::VideoReviewed,
                subject_user_id: *user_id,
                entity: EntityRef::new(EntityType::Video, *video_id),
                include_admins: false,
                include_trainer: true,
            },
            DomainEvent::PlanAssigned {
                assignment_id,
                user_id,
                ..
            } => EventRoute {
                notification_type: NotificationType::PlanAssigned,
                subject_user_id: *user_id,
                entity: EntityRef::new(EntityType::PlanAssignment, *assignment_id),
                include_admins: false,
                include_trainer: true,
            },
        }
    }
}

fn subscription_route(
    notification_type: NotificationType,
    subscription_id: Uuid,
    user_id: Uuid,
) -> EventRoute {
    EventRoute {
        notification_type,
        subject_user_id: user_id,
        entity: EntityRef::new(EntityType::Subscription, subscription_id),
        include_admins: true,
        include_trainer: false,
    }
}
