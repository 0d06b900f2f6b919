use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::users::UserEntity, repositories::recipients::RecipientDirectory,
        value_objects::enums::user_roles::UserRole,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users},
};

pub struct RecipientPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl RecipientPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RecipientDirectory for RecipientPostgres {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .find(user_id)
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn list_admins(&self) -> Result<Vec<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let admins = users::table
            .filter(users::role.eq(UserRole::Admin.to_string()))
            .order(users::created_at.asc())
            .select(UserEntity::as_select())
            .load::<UserEntity>(&mut conn)?;

        Ok(admins)
    }

    async fn find_assigned_trainer(&self, member_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let trainer_id = users::table
            .find(member_id)
            .select(users::assigned_trainer_id)
            .first::<Option<Uuid>>(&mut conn)
            .optional()?
            .flatten();

        let Some(trainer_id) = trainer_id else {
            return Ok(None);
        };

        let trainer = users::table
            .find(trainer_id)
            .filter(users::role.eq(UserRole::Trainer.to_string()))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(trainer)
    }
}
