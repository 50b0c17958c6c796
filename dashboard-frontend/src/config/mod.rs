use crate::hooks::JobPolling;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{load_settings, TelemetrySettings};
use service_core::error::AppError;
use std::time::Duration;
use validator::Validate;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub list: ListSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// The dashboard REST API every list and mutation talks to.
#[derive(Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Sent as a bearer token on every request.
    pub token: Secret<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ListSettings {
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    #[serde(default = "default_search_debounce_ms")]
    #[validate(range(max = 5000))]
    pub search_debounce_ms: u64,
    /// How long a fetched list is served from cache without a request.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// How long an unused cache entry is kept before eviction.
    #[serde(default = "default_gc_after_secs")]
    pub gc_after_secs: u64,
    /// Poll interval for a job that is still pending or processing.
    #[serde(default = "default_job_poll_interval_ms")]
    #[validate(range(min = 100))]
    pub job_poll_interval_ms: u64,
    #[serde(default = "default_job_stale_after_secs")]
    pub job_stale_after_secs: u64,
}

impl ListSettings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn gc_after(&self) -> Duration {
        Duration::from_secs(self.gc_after_secs)
    }

    pub fn job_polling(&self) -> JobPolling {
        JobPolling {
            interval: Duration::from_millis(self.job_poll_interval_ms),
            stale_after: Duration::from_secs(self.job_stale_after_secs),
        }
    }
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            stale_after_secs: default_stale_after_secs(),
            gc_after_secs: default_gc_after_secs(),
            job_poll_interval_ms: default_job_poll_interval_ms(),
            job_stale_after_secs: default_job_stale_after_secs(),
        }
    }
}

fn default_page_size() -> u32 {
    crate::query::DEFAULT_PAGE_SIZE
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_stale_after_secs() -> u64 {
    30
}

fn default_gc_after_secs() -> u64 {
    300
}

fn default_job_poll_interval_ms() -> u64 {
    2000
}

fn default_job_stale_after_secs() -> u64 {
    10
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let settings: Settings = load_settings("dashboard-frontend")?;
    settings.list.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_defaults_match_the_dashboard() {
        let list = ListSettings::default();
        assert_eq!(list.page_size, 20);
        assert_eq!(list.search_debounce(), Duration::from_millis(300));
        assert_eq!(list.stale_after(), Duration::from_secs(30));
        assert_eq!(list.gc_after(), Duration::from_secs(300));
        assert_eq!(list.job_polling().interval, Duration::from_secs(2));
        assert_eq!(list.job_polling().stale_after, Duration::from_secs(10));
        assert!(list.validate().is_ok());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let list = ListSettings {
            page_size: 0,
            ..ListSettings::default()
        };
        assert!(list.validate().is_err());
    }

    #[test]
    fn missing_list_section_falls_back_to_defaults() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "server": { "host": "127.0.0.1", "port": 8080 },
            "api": { "base_url": "http://localhost:9000", "token": "t" }
        }))
        .unwrap();
        assert_eq!(settings.list.page_size, 20);
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.telemetry.log_level, "info");
    }
}
