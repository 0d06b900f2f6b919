use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::job_leases;

#[derive(Debug, Clone, PartialEq, QueryableByName)]
#[diesel(table_name = job_leases)]
pub struct JobLeaseEntity {
    pub name: String,
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
