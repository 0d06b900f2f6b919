use chrono::Duration;
use memberhub::domain::value_objects::suppression::SuppressionPolicy;
use url::Url;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub internal_api: InternalApi,
    pub sweep: Sweep,
    pub notifications: Notifications,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct InternalApi {
    /// `None` disables every internal route (503).
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Sweep {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_size: i64,
    pub lease_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Notifications {
    pub suppression: SuppressionPolicy,
    pub push_webhook_url: Option<Url>,
    pub event_queue_capacity: usize,
}
