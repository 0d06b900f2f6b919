use crate::domain::value_objects::{enums::audiences::Audience, events::DomainEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl RenderedMessage {
    fn new(title: impl Into<String>, message: impl Into<String>, link: String) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            link: Some(link),
        }
    }
}

/// Text for one recipient. Members read about "your" things, staff read
/// about the member by name; links point into the area each audience uses.
pub fn render(event: &DomainEvent, audience: Audience, member_name: &str) -> RenderedMessage {
    let staff_prefix = match audience {
        Audience::Admin => "/admin",
        Audience::Trainer => "/trainer",
        Audience::Member => "",
    };
    let is_member = audience == Audience::Member;

    match event {
        DomainEvent::MemberRegistered { user_id } => {
            if is_member {
                RenderedMessage::new(
                    "Welcome aboard",
                    "Your account is ready. Pick a plan to start training.",
                    "/plans".to_string(),
                )
            } else {
                RenderedMessage::new(
                    "New member registered",
                    format!("{member_name} just created an account."),
                    format!("{staff_prefix}/members/{user_id}"),
                )
            }
        }
        DomainEvent::SubscriptionCreated {
            subscription_id,
            plan_name,
            ..
        } => subscription_message(
            is_member,
            *subscription_id,
            staff_prefix,
            "Subscription started",
            format!("Your {} subscription is being set up.", plan(plan_name)),
            "New subscription",
            format!("{member_name} subscribed to {}.", plan(plan_name)),
        ),
        DomainEvent::SubscriptionActivated {
            subscription_id,
            plan_name,
            ..
        } => subscription_message(
            is_member,
            *subscription_id,
            staff_prefix,
            "Subscription active",
            format!("Your {} subscription is now active.", plan(plan_name)),
            "Subscription activated",
            format!("{member_name}'s {} subscription is now active.", plan(plan_name)),
        ),
        DomainEvent::SubscriptionPastDue {
            subscription_id,
            plan_name,
            ..
        } => subscription_message(
            is_member,
            *subscription_id,
            staff_prefix,
            "Payment failed",
            format!(
                "We could not collect the payment for your {} subscription. Update your payment method to keep access.",
                plan(plan_name)
            ),
            "Subscription past due",
            format!("{member_name}'s {} payment failed.", plan(plan_name)),
        ),
        DomainEvent::SubscriptionCanceled {
            subscription_id,
            plan_name,
            ..
        } => subscription_message(
            is_member,
            *subscription_id,
            staff_prefix,
            "Subscription canceled",
            format!("Your {} subscription has been canceled.", plan(plan_name)),
            "Subscription canceled",
            format!("{member_name} canceled their {} subscription.", plan(plan_name)),
        ),
        DomainEvent::SubscriptionExpired {
            subscription_id,
            plan_name,
            ..
        } => subscription_message(
            is_member,
            *subscription_id,
            staff_prefix,
            "Subscription expired",
            format!(
                "Your {} subscription has expired. Renew to continue training.",
                plan(plan_name)
            ),
            "Subscription expired",
            format!("{member_name}'s {} subscription expired.", plan(plan_name)),
        ),
        DomainEvent::VideoUploaded {
            video_id, title, ..
        } => {
            let title = video(title);
            if is_member {
                RenderedMessage::new(
                    "Video uploaded",
                    format!("Your video {title} was uploaded and is waiting for review."),
                    format!("/videos/{video_id}"),
                )
            } else {
                RenderedMessage::new(
                    "New video to review",
                    format!("{member_name} uploaded {title}."),
                    format!("{staff_prefix}/videos/{video_id}"),
                )
            }
        }
        DomainEvent::VideoReviewed {
            video_id,
            approved,
            note,
            ..
        } => {
            let verdict = if *approved { "approved" } else { "rejected" };
            if is_member {
                let mut message = format!("Your video was {verdict}.");
                if let Some(note) = note.as_deref().filter(|note| !note.trim().is_empty()) {
                    message.push_str(&format!(" Note: {}", note.trim()));
                }
                RenderedMessage::new("Video reviewed", message, format!("/videos/{video_id}"))
            } else {
                RenderedMessage::new(
                    "Video review recorded",
                    format!("{member_name}'s video was {verdict}."),
                    format!("{staff_prefix}/videos/{video_id}"),
                )
            }
        }
        DomainEvent::PlanAssigned {
            assignment_id,
            plan_kind,
            plan_name,
            ..
        } => {
            let name = plan_name
                .as_deref()
                .map(|name| format!(" \"{name}\""))
                .unwrap_or_default();
            if is_member {
                RenderedMessage::new(
                    format!("New {plan_kind} plan"),
                    format!("You have been assigned a new {plan_kind} plan{name}."),
                    format!("/{plan_kind}-plans/{assignment_id}"),
                )
            } else {
                RenderedMessage::new(
                    format!("{} plan assigned", capitalize(plan_kind.as_str())),
                    format!("{member_name} was assigned the {plan_kind} plan{name}."),
                    format!("{staff_prefix}/{plan_kind}-plans/{assignment_id}"),
                )
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn subscription_message(
    is_member: bool,
    subscription_id: uuid::Uuid,
    staff_prefix: &str,
    member_title: &str,
    member_message: String,
    staff_title: &str,
    staff_message: String,
) -> RenderedMessage {
    if is_member {
        RenderedMessage::new(
            member_title,
            member_message,
            format!("/subscriptions/{subscription_id}"),
        )
    } else {
        RenderedMessage::new(
            staff_title,
            staff_message,
            format!("{staff_prefix}/subscriptions/{subscription_id}"),
        )
    }
}

fn plan(plan_name: &Option<String>) -> String {
    match plan_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => "membership".to_string(),
    }
}

fn video(title: &Option<String>) -> String {
    match title.as_deref() {
        Some(title) if !title.trim().is_empty() => format!("\"{}\"", title.trim()),
        _ => "a new video".to_string(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::assigned_plan_kinds::AssignedPlanKind;
    use uuid::Uuid;

    #[test]
    fn member_and_staff_wording_differ() {
        let subscription_id = Uuid::new_v4();
        let event = DomainEvent::SubscriptionExpired {
            subscription_id,
            user_id: Uuid::new_v4(),
            plan_name: Some("Gold".to_string()),
        };

        let member = render(&event, Audience::Member, "Sam");
        let admin = render(&event, Audience::Admin, "Sam");

        assert!(member.message.starts_with("Your Gold subscription"));
        assert_eq!(admin.message, "Sam's Gold subscription expired.");
        assert_eq!(
            member.link.as_deref(),
            Some(format!("/subscriptions/{subscription_id}").as_str())
        );
        assert_eq!(
            admin.link.as_deref(),
            Some(format!("/admin/subscriptions/{subscription_id}").as_str())
        );
    }

    #[test]
    fn trainer_links_stay_in_trainer_area() {
        let assignment_id = Uuid::new_v4();
        let event = DomainEvent::PlanAssigned {
            assignment_id,
            user_id: Uuid::new_v4(),
            plan_kind: AssignedPlanKind::Diet,
            plan_name: None,
        };

        let rendered = render(&event, Audience::Trainer, "Sam");

        assert_eq!(rendered.title, "Diet plan assigned");
        assert_eq!(rendered.message, "Sam was assigned the diet plan.");
        assert_eq!(
            rendered.link,
            Some(format!("/trainer/diet-plans/{assignment_id}"))
        );
    }

    #[test]
    fn review_note_only_reaches_the_member() {
        let event = DomainEvent::VideoReviewed {
            video_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            approved: false,
            note: Some(" Keep your back straight ".to_string()),
        };

        let member = render(&event, Audience::Member, "Sam");
        let trainer = render(&event, Audience::Trainer, "Sam");

        assert_eq!(
            member.message,
            "Your video was rejected. Note: Keep your back straight"
        );
        assert_eq!(trainer.message, "Sam's video was rejected.");
    }
}
