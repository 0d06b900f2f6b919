use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::UserEntity;

/// Looks up the people a notification can be fanned out to.
#[automock]
#[async_trait]
pub trait RecipientDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn list_admins(&self) -> Result<Vec<UserEntity>>;

    async fn find_assigned_trainer(&self, member_id: Uuid) -> Result<Option<UserEntity>>;
}
