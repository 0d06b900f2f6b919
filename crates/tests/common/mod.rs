//! In-memory repositories and fixtures shared by the integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use memberhub::{
    domain::{
        clock::Clock,
        entities::{
            notifications::{InsertNotificationEntity, NotificationEntity},
            plans::PlanEntity,
            subscriptions::{SubscriptionChangeset, SubscriptionEntity},
            users::UserEntity,
        },
        repositories::{
            job_leases::JobLeaseRepository, notifications::NotificationRepository,
            plans::PlanRepository, recipients::RecipientDirectory,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            enums::{
                duration_types::DurationType, notification_types::NotificationType,
                subscription_statuses::SubscriptionStatus,
            },
            events::DomainEvent,
            subscriptions::ExpirationCursor,
        },
    },
    usecases::event_bus::EventPublisher,
};
use uuid::Uuid;

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Clock the tests move by hand.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn plan(duration_type: DurationType, duration_count: i32, trial_days: i32) -> PlanEntity {
    PlanEntity {
        id: Uuid::new_v4(),
        name: "Gold".to_string(),
        price_minor: 2999,
        duration_type: duration_type.to_string(),
        duration_count,
        trial_days,
        is_active: true,
        created_at: at(2023, 12, 1),
    }
}

pub fn subscription(
    plan: &PlanEntity,
    status: SubscriptionStatus,
    expiration_at: Option<DateTime<Utc>>,
) -> SubscriptionEntity {
    SubscriptionEntity {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        plan_id: plan.id,
        gateway: "stripe".to_string(),
        gateway_subscription_id: Some(format!("sub_{}", Uuid::new_v4().simple())),
        status: status.to_string(),
        trial_end_at: None,
        next_billing_at: None,
        expiration_at,
        started_at: None,
        canceled_at: None,
        gateway_metadata: serde_json::json!({}),
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

pub fn user(name: &str, role: &str, assigned_trainer_id: Option<Uuid>) -> UserEntity {
    UserEntity {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@gym.test", name.to_lowercase()),
        role: role.to_string(),
        assigned_trainer_id,
        created_at: at(2024, 1, 1),
    }
}

#[derive(Default)]
pub struct InMemorySubscriptions {
    rows: Mutex<HashMap<Uuid, SubscriptionEntity>>,
}

impl InMemorySubscriptions {
    pub fn with(rows: impl IntoIterator<Item = SubscriptionEntity>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows.into_iter().map(|row| (row.id, row)).collect()),
        })
    }

    pub fn get(&self, id: Uuid) -> SubscriptionEntity {
        self.rows.lock().unwrap()[&id].clone()
    }

    pub fn status_of(&self, id: Uuid) -> Option<SubscriptionStatus> {
        self.get(id).status()
    }
}

fn is_due(row: &SubscriptionEntity, now: DateTime<Utc>) -> bool {
    row.status().is_some_and(|status| status.is_expirable())
        && row.expiration_at.is_some_and(|expiration_at| expiration_at <= now)
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptions {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        Ok(self.rows.lock().unwrap().get(&subscription_id).cloned())
    }

    async fn list_expirable_batch(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpirationCursor>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>> {
        let rows = self.rows.lock().unwrap();
        let mut due: Vec<SubscriptionEntity> = rows
            .values()
            .filter(|row| is_due(row, now))
            .filter(|row| match (after, row.expiration_at) {
                (Some(cursor), Some(expiration_at)) => {
                    (expiration_at, row.id) > (cursor.expiration_at, cursor.id)
                }
                _ => true,
            })
            .cloned()
            .collect();
        due.sort_by_key(|row| (row.expiration_at, row.id));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn mark_expired(
        &self,
        subscription_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let mut rows = self.rows.lock().unwrap();
        let mut updated = Vec::new();
        for id in subscription_ids {
            if let Some(row) = rows.get_mut(id) {
                if is_due(row, now) {
                    row.status = SubscriptionStatus::Expired.to_string();
                    row.updated_at = now;
                    updated.push(*id);
                }
            }
        }
        Ok(updated)
    }

    async fn list_batch_after_id(
        &self,
        after: Option<Uuid>,
        limit: i64,
        only_missing_expiration: bool,
    ) -> Result<Vec<SubscriptionEntity>> {
        let rows = self.rows.lock().unwrap();
        let mut page: Vec<SubscriptionEntity> = rows
            .values()
            .filter(|row| after.is_none_or(|after| row.id > after))
            .filter(|row| !only_missing_expiration || row.expiration_at.is_none())
            .cloned()
            .collect();
        page.sort_by_key(|row| row.id);
        page.truncate(limit.max(0) as usize);
        Ok(page)
    }

    async fn update_expiration(
        &self,
        subscription_id: Uuid,
        expiration_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&subscription_id)
            .ok_or_else(|| anyhow!("subscription {subscription_id} missing"))?;
        row.expiration_at = Some(expiration_at);
        row.updated_at = now;
        Ok(())
    }

    async fn apply_changes(
        &self,
        subscription_id: Uuid,
        expected_status: SubscriptionStatus,
        changes: SubscriptionChangeset,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&subscription_id) else {
            return Ok(None);
        };
        if row.status() != Some(expected_status) {
            return Ok(None);
        }

        if let Some(status) = changes.status {
            row.status = status;
        }
        if changes.trial_end_at.is_some() {
            row.trial_end_at = changes.trial_end_at;
        }
        if changes.next_billing_at.is_some() {
            row.next_billing_at = changes.next_billing_at;
        }
        if changes.expiration_at.is_some() {
            row.expiration_at = changes.expiration_at;
        }
        if changes.started_at.is_some() {
            row.started_at = changes.started_at;
        }
        if changes.canceled_at.is_some() {
            row.canceled_at = changes.canceled_at;
        }
        row.updated_at = changes.updated_at;

        Ok(Some(row.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryPlans {
    rows: Mutex<HashMap<Uuid, PlanEntity>>,
}

impl InMemoryPlans {
    pub fn with(rows: impl IntoIterator<Item = PlanEntity>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows.into_iter().map(|row| (row.id, row)).collect()),
        })
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlans {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        Ok(self.rows.lock().unwrap().get(&plan_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<NotificationEntity>>,
}

impl InMemoryNotifications {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<NotificationEntity> {
        self.rows.lock().unwrap().clone()
    }

    pub fn for_recipient(&self, recipient_id: Uuid) -> Vec<NotificationEntity> {
        self.all()
            .into_iter()
            .filter(|row| row.recipient_id == recipient_id)
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn insert(&self, notification: InsertNotificationEntity) -> Result<NotificationEntity> {
        let row = NotificationEntity {
            id: Uuid::new_v4(),
            recipient_id: notification.recipient_id,
            notification_type: notification.notification_type,
            audience: notification.audience,
            title: notification.title,
            message: notification.message,
            link: notification.link,
            entity_type: notification.entity_type,
            entity_id: notification.entity_id,
            payload: notification.payload,
            created_at: notification.created_at,
            read_at: None,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn exists_since(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        entity_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.rows.lock().unwrap().iter().any(|row| {
            row.recipient_id == recipient_id
                && row.notification_type == notification_type.as_str()
                && row.entity_id == entity_id
                && row.created_at >= since
        }))
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>> {
        let mut rows: Vec<NotificationEntity> = self
            .for_recipient(recipient_id)
            .into_iter()
            .filter(|row| !unread_only || row.read_at.is_none())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|row| {
            row.id == notification_id && row.recipient_id == recipient_id && row.read_at.is_none()
        });
        Ok(match row {
            Some(row) => {
                row.read_at = Some(read_at);
                true
            }
            None => false,
        })
    }

    async fn mark_all_read(&self, recipient_id: Uuid, read_at: DateTime<Utc>) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let mut updated = 0;
        for row in rows
            .iter_mut()
            .filter(|row| row.recipient_id == recipient_id && row.read_at.is_none())
        {
            row.read_at = Some(read_at);
            updated += 1;
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<Uuid, UserEntity>>,
}

impl InMemoryDirectory {
    pub fn with(users: impl IntoIterator<Item = UserEntity>) -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(users.into_iter().map(|user| (user.id, user)).collect()),
        })
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<UserEntity>> {
        let mut admins: Vec<UserEntity> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|user| user.role == "admin")
            .cloned()
            .collect();
        admins.sort_by_key(|user| user.id);
        Ok(admins)
    }

    async fn find_assigned_trainer(&self, member_id: Uuid) -> Result<Option<UserEntity>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .get(&member_id)
            .and_then(|member| member.assigned_trainer_id)
            .and_then(|trainer_id| users.get(&trainer_id))
            .filter(|trainer| trainer.role == "trainer")
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryLeases {
    leases: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl InMemoryLeases {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pretends another worker holds `name` until `expires_at`.
    pub fn hold(&self, name: &str, expires_at: DateTime<Utc>) {
        self.leases
            .lock()
            .unwrap()
            .insert(name.to_string(), ("someone-else".to_string(), expires_at));
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.leases.lock().unwrap().contains_key(name)
    }
}

#[async_trait]
impl JobLeaseRepository for InMemoryLeases {
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        let mut leases = self.leases.lock().unwrap();
        if let Some((current, expires_at)) = leases.get(name) {
            if current != holder && *expires_at > now {
                return Ok(false);
            }
        }
        leases.insert(name.to_string(), (holder.to_string(), now + ttl));
        Ok(true)
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        let mut leases = self.leases.lock().unwrap();
        if leases.get(name).is_some_and(|(current, _)| current == holder) {
            leases.remove(name);
        }
        Ok(())
    }
}

/// Publisher that keeps every event instead of queueing it.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
