use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use memberhub::domain::value_objects::{
    enums::notification_types::NotificationType, suppression::SuppressionPolicy,
};
use url::Url;

use super::config_model::{
    Database, DotEnvyConfig, InternalApi, Notifications, Sweep, WorkerServer,
};

const MAX_BODY_LIMIT_MB: usize = 1024;
const MAX_TIMEOUT_SECS: u64 = 3_600;
const MAX_SWEEP_INTERVAL_SECS: u64 = 7 * 86_400;
const MAX_LEASE_TTL_SECS: i64 = 86_400;
const MAX_SUPPRESSION_WINDOW_MINUTES: i64 = 30 * 24 * 60;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let worker_server = WorkerServer {
        port: required(&lookup, "SERVER_PORT_WORKER")?,
        body_limit_bytes: megabytes(
            "SERVER_BODY_LIMIT",
            optional(&lookup, "SERVER_BODY_LIMIT", 1)?,
        )?,
        timeout: at_most(
            "SERVER_TIMEOUT",
            optional(&lookup, "SERVER_TIMEOUT", 30)?,
            MAX_TIMEOUT_SECS,
        )?,
    };

    let database = Database {
        url: non_empty(&lookup, "DATABASE_URL").context("DATABASE_URL is invalid")?,
        max_connections: optional(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let internal_api = InternalApi {
        token: non_empty(&lookup, "INTERNAL_API_TOKEN"),
    };

    let sweep = Sweep {
        enabled: optional(&lookup, "SWEEP_ENABLED", true)?,
        interval_secs: at_most(
            "SWEEP_INTERVAL_SECS",
            optional::<u64>(&lookup, "SWEEP_INTERVAL_SECS", 300)?.max(1),
            MAX_SWEEP_INTERVAL_SECS,
        )?,
        batch_size: optional::<i64>(&lookup, "SWEEP_BATCH_SIZE", 100)?.max(1),
        lease_ttl: seconds(
            "SWEEP_LEASE_TTL_SECS",
            optional::<i64>(&lookup, "SWEEP_LEASE_TTL_SECS", 300)?.max(1),
        )?,
    };

    let push_webhook_url = non_empty(&lookup, "PUSH_WEBHOOK_URL")
        .map(|raw| Url::parse(&raw))
        .transpose()
        .context("PUSH_WEBHOOK_URL is invalid")?;

    let notifications = Notifications {
        suppression: load_suppression_policy(&lookup)?,
        push_webhook_url,
        event_queue_capacity: optional::<usize>(&lookup, "EVENT_QUEUE_CAPACITY", 1024)?.max(1),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        internal_api,
        sweep,
        notifications,
    })
}

/// Built-in windows, overridden by `SUPPRESSION_WINDOW_MINUTES_DEFAULT` and
/// `SUPPRESSION_WINDOW_MINUTES_<EVENT_TYPE>` (e.g. `..._VIDEO_UPLOADED`).
/// Setting only the default applies it to every type without its own
/// variable.
pub fn load_suppression_policy(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<SuppressionPolicy> {
    let builtin = SuppressionPolicy::default();
    let default_minutes: Option<i64> = parse(lookup, "SUPPRESSION_WINDOW_MINUTES_DEFAULT")?;
    let default_window = match default_minutes {
        Some(value) => minutes("SUPPRESSION_WINDOW_MINUTES_DEFAULT", value)?,
        None => builtin.default_window(),
    };

    let mut policy = SuppressionPolicy::new(default_window);
    for notification_type in NotificationType::ALL {
        let key = format!(
            "SUPPRESSION_WINDOW_MINUTES_{}",
            notification_type.as_str().to_ascii_uppercase()
        );
        let window = match parse::<i64>(lookup, &key)? {
            Some(value) => minutes(&key, value)?,
            None if default_minutes.is_some() => default_window,
            None => builtin.window_for(notification_type),
        };
        policy = policy.with_window(notification_type, window);
    }

    Ok(policy)
}

/// Negative windows collapse to zero, which disables suppression.
fn minutes(key: &str, value: i64) -> Result<Duration> {
    let value = at_most(key, value.max(0), MAX_SUPPRESSION_WINDOW_MINUTES)?;
    Duration::try_minutes(value).with_context(|| format!("{key} is invalid"))
}

fn seconds(key: &str, value: i64) -> Result<Duration> {
    let value = at_most(key, value, MAX_LEASE_TTL_SECS)?;
    Duration::try_seconds(value).with_context(|| format!("{key} is invalid"))
}

fn megabytes(key: &str, value: usize) -> Result<usize> {
    at_most(key, value, MAX_BODY_LIMIT_MB)?
        .checked_mul(1024 * 1024)
        .with_context(|| format!("{key} is invalid"))
}

fn at_most<T>(key: &str, value: T, max: T) -> Result<T>
where
    T: PartialOrd + std::fmt::Display,
{
    if value > max {
        bail!("{key} is invalid: {value} exceeds the maximum of {max}");
    }
    Ok(value)
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).and_then(|value| {
        let trimmed = value.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    non_empty(lookup, key)
        .map(|value| value.parse::<T>())
        .transpose()
        .with_context(|| format!("{key} is invalid"))
}

fn required<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse(lookup, key)?.with_context(|| format!("{key} is missing"))
}

fn optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn loads_defaults_around_required_values() {
        let config = load_from(env(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost/memberhub"),
            ("INTERNAL_API_TOKEN", "  "),
        ]))
        .unwrap();

        assert_eq!(config.worker_server.port, 8081);
        assert_eq!(config.worker_server.timeout, 30);
        assert_eq!(config.worker_server.body_limit_bytes, 1024 * 1024);
        assert_eq!(config.sweep.lease_ttl, Duration::minutes(5));
        assert!(config.internal_api.token.is_none());
        assert!(config.sweep.enabled);
        assert_eq!(config.sweep.batch_size, 100);
        assert!(config.notifications.push_webhook_url.is_none());
        assert_eq!(config.notifications.suppression, SuppressionPolicy::default());
    }

    #[test]
    fn missing_port_is_an_error() {
        let err = load_from(env(&[("DATABASE_URL", "postgres://localhost/memberhub")]))
            .unwrap_err();

        assert!(err.to_string().contains("SERVER_PORT_WORKER"));
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = load_from(env(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost/memberhub"),
            ("SWEEP_BATCH_SIZE", "lots"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("SWEEP_BATCH_SIZE"));
    }

    #[test]
    fn per_type_window_beats_default_override() {
        let lookup = env(&[
            ("SUPPRESSION_WINDOW_MINUTES_DEFAULT", "3"),
            ("SUPPRESSION_WINDOW_MINUTES_VIDEO_UPLOADED", "0"),
        ]);

        let policy = load_suppression_policy(&lookup).unwrap();

        assert_eq!(
            policy.window_for(NotificationType::VideoUploaded),
            Duration::zero()
        );
        assert_eq!(
            policy.window_for(NotificationType::SubscriptionExpired),
            Duration::minutes(3)
        );
    }

    #[test]
    fn builtin_windows_apply_without_overrides() {
        let policy = load_suppression_policy(&env(&[])).unwrap();

        assert_eq!(
            policy.window_for(NotificationType::SubscriptionCanceled),
            Duration::minutes(10)
        );
        assert_eq!(
            policy.window_for(NotificationType::VideoReviewed),
            Duration::minutes(2)
        );
    }

    #[test]
    fn oversized_suppression_window_is_an_error() {
        let lookup = env(&[(
            "SUPPRESSION_WINDOW_MINUTES_DEFAULT",
            "9223372036854775807",
        )]);

        let err = load_suppression_policy(&lookup).unwrap_err();

        assert!(err.to_string().contains("SUPPRESSION_WINDOW_MINUTES_DEFAULT"));
    }

    #[test]
    fn oversized_per_type_window_is_an_error() {
        let lookup = env(&[("SUPPRESSION_WINDOW_MINUTES_PLAN_ASSIGNED", "99999999")]);

        let err = load_suppression_policy(&lookup).unwrap_err();

        assert!(err.to_string().contains("SUPPRESSION_WINDOW_MINUTES_PLAN_ASSIGNED"));
    }

    #[test]
    fn oversized_durations_and_sizes_are_errors() {
        for (key, value) in [
            ("SWEEP_LEASE_TTL_SECS", "9223372036854775807"),
            ("SWEEP_INTERVAL_SECS", "18446744073709551615"),
            ("SERVER_BODY_LIMIT", "18446744073709551615"),
            ("SERVER_TIMEOUT", "86400"),
        ] {
            let err = load_from(env(&[
                ("SERVER_PORT_WORKER", "8081"),
                ("DATABASE_URL", "postgres://localhost/memberhub"),
                (key, value),
            ]))
            .unwrap_err();

            assert!(err.to_string().contains(key), "{key}: {err}");
        }
    }

    #[test]
    fn lease_ttl_at_the_cap_is_accepted() {
        let config = load_from(env(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost/memberhub"),
            ("SWEEP_LEASE_TTL_SECS", "86400"),
            ("SUPPRESSION_WINDOW_MINUTES_DEFAULT", "-5"),
        ]))
        .unwrap();

        assert_eq!(config.sweep.lease_ttl, Duration::days(1));
        assert_eq!(
            config.notifications.suppression.window_for(NotificationType::PlanAssigned),
            Duration::zero()
        );
    }
}
