use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Trialing,
    Active,
    PastDue,
    Canceled,
    Expired,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SubscriptionStatus {
    /// Statuses the expiration sweep is allowed to move to `Expired`.
    pub const EXPIRABLE: [SubscriptionStatus; 3] = [
        SubscriptionStatus::Trialing,
        SubscriptionStatus::Active,
        SubscriptionStatus::PastDue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SubscriptionStatus::Pending),
            "trialing" => Some(SubscriptionStatus::Trialing),
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    pub fn expirable_values() -> Vec<String> {
        Self::EXPIRABLE.iter().map(|s| s.to_string()).collect()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Canceled | SubscriptionStatus::Expired
        )
    }

    pub fn is_expirable(&self) -> bool {
        Self::EXPIRABLE.contains(self)
    }

    /// Whether `self -> next` is an edge of the subscription state machine.
    /// Re-applying the current status is accepted so repeated gateway
    /// deliveries stay harmless.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Trialing | Active | Canceled)
                | (Trialing, Active | PastDue | Canceled | Expired)
                | (Active, PastDue | Canceled | Expired)
                | (PastDue, Active | Canceled | Expired)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_never_leave() {
        for terminal in [SubscriptionStatus::Canceled, SubscriptionStatus::Expired] {
            for next in [
                SubscriptionStatus::Pending,
                SubscriptionStatus::Trialing,
                SubscriptionStatus::Active,
                SubscriptionStatus::PastDue,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
        assert!(!SubscriptionStatus::Canceled.can_transition_to(SubscriptionStatus::Expired));
        assert!(!SubscriptionStatus::Expired.can_transition_to(SubscriptionStatus::Canceled));
    }

    #[test]
    fn past_due_can_return_to_active() {
        assert!(SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::PastDue));
        assert!(SubscriptionStatus::PastDue.can_transition_to(SubscriptionStatus::Active));
    }

    #[test]
    fn pending_cannot_skip_to_past_due_or_expired() {
        assert!(!SubscriptionStatus::Pending.can_transition_to(SubscriptionStatus::PastDue));
        assert!(!SubscriptionStatus::Pending.can_transition_to(SubscriptionStatus::Expired));
        assert!(SubscriptionStatus::Pending.can_transition_to(SubscriptionStatus::Trialing));
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in [
            SubscriptionStatus::Trialing,
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
        ] {
            assert!(!from.can_transition_to(SubscriptionStatus::Pending));
        }
    }

    #[test]
    fn round_trips_database_values() {
        assert_eq!(
            SubscriptionStatus::from_str("past_due"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(SubscriptionStatus::PastDue.to_string(), "past_due");
        assert_eq!(SubscriptionStatus::from_str("paused"), None);
    }
}
