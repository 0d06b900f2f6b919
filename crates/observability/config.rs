use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    pub service_name: String,
    pub environment: String,
    pub component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let component = component.trim().to_string();

        let service_name = lookup("SERVICE_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("memberhub-{component}"));

        let environment = lookup("STAGE")
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
        }
    }
}
