use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::duration_types::DurationType,
    infra::db::postgres::schema::subscription_plans,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub duration_type: String,
    pub duration_count: i32,
    pub trial_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PlanEntity {
    pub fn duration_type(&self) -> Option<DurationType> {
        DurationType::from_str(&self.duration_type)
    }

    /// A plan that is nothing but a trial: it ends when the trial ends.
    pub fn is_pure_trial(&self) -> bool {
        self.duration_type() == Some(DurationType::Trial)
    }

    pub fn has_trial(&self) -> bool {
        self.trial_days > 0 || self.is_pure_trial()
    }

    /// Length of one paid period, or `None` for an unknown duration type.
    pub fn billing_period(&self) -> Option<Duration> {
        let duration_type = self.duration_type()?;
        let count = i64::from(self.duration_count.max(0));

        if duration_type == DurationType::Trial && count == 0 {
            return Some(Duration::days(i64::from(self.trial_days.max(0))));
        }

        Some(Duration::days(count * duration_type.unit_days()))
    }
}
