use std::time::Duration;

use serde::Deserialize;

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub rate_limit: RateLimitSettings,
    pub dispatcher: DispatcherSettings,
    pub watchdog: WatchdogSettings,
    pub provider: ProviderSettings,
}

impl Settings {
    /// Build settings from environment variables, with defaults for local use.
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings {
                host: env_string("SERVER_HOST", "0.0.0.0"),
                port: env_parsed("SERVER_PORT", 3000),
            },
            logging: LoggingSettings {
                environment: env_string("APP_ENV", "development"),
                json_format: env_string("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            },
            database: DatabaseSettings {
                url: env_string("DATABASE_URL", "postgres://localhost/coursesmith"),
                max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", 5),
            },
            rate_limit: RateLimitSettings {
                submissions_per_window: env_parsed("RATE_LIMIT_SUBMISSIONS", 5),
                window_seconds: env_parsed("RATE_LIMIT_WINDOW_SECONDS", 3600),
            },
            dispatcher: DispatcherSettings {
                workers: env_parsed("DISPATCHER_WORKERS", 2),
                poll_interval_ms: env_parsed("DISPATCHER_POLL_INTERVAL_MS", 1000),
            },
            watchdog: WatchdogSettings {
                stale_after_seconds: env_parsed("WATCHDOG_STALE_AFTER_SECONDS", 300),
                scan_interval_seconds: env_parsed("WATCHDOG_SCAN_INTERVAL_SECONDS", 60),
            },
            provider: ProviderSettings {
                base_url: env_string("PROVIDER_BASE_URL", "https://api.openai.com/v1"),
                api_key: env_string("PROVIDER_API_KEY", ""),
                model: env_string("PROVIDER_MODEL", "gpt-4o-mini"),
                timeout_seconds: env_parsed("PROVIDER_TIMEOUT_SECONDS", 120),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub environment: String,
    pub json_format: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    pub submissions_per_window: u32,
    pub window_seconds: u64,
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherSettings {
    pub workers: usize,
    pub poll_interval_ms: u64,
}

impl DispatcherSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogSettings {
    pub stale_after_seconds: u64,
    pub scan_interval_seconds: u64,
}

impl WatchdogSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_seconds)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
