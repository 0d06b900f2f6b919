use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::{
    prelude::*,
    sql_query,
    sql_types::{Text, Timestamptz},
};
use std::sync::Arc;

use crate::{
    domain::{entities::job_leases::JobLeaseEntity, repositories::job_leases::JobLeaseRepository},
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::job_leases},
};

pub struct JobLeasePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl JobLeasePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl JobLeaseRepository for JobLeasePostgres {
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        let expires_at = now
            .checked_add_signed(ttl)
            .with_context(|| format!("lease ttl {ttl} overflows from {now}"))?;
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Conditional upsert: the row is only taken over once the previous
        // lease has lapsed or when the same holder renews it. No row back
        // means someone else still holds it.
        let acquired = sql_query(
            "INSERT INTO job_leases (name, holder, acquired_at, expires_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name) DO UPDATE \
             SET holder = EXCLUDED.holder, \
                 acquired_at = EXCLUDED.acquired_at, \
                 expires_at = EXCLUDED.expires_at \
             WHERE job_leases.expires_at <= EXCLUDED.acquired_at \
                OR job_leases.holder = EXCLUDED.holder \
             RETURNING name, holder, acquired_at, expires_at",
        )
        .bind::<Text, _>(name)
        .bind::<Text, _>(holder)
        .bind::<Timestamptz, _>(now)
        .bind::<Timestamptz, _>(expires_at)
        .get_results::<JobLeaseEntity>(&mut conn)?;

        Ok(acquired.iter().any(|lease| lease.holder == holder))
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::delete(job_leases::table)
            .filter(job_leases::name.eq(name))
            .filter(job_leases::holder.eq(holder))
            .execute(&mut conn)?;

        Ok(())
    }
}
