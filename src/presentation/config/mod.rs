mod scaffold_config;
mod settings;

pub use scaffold_config::ScaffoldConfig;
pub use settings::{
    DatabaseSettings, DispatcherSettings, LoggingSettings, ProviderSettings, RateLimitSettings,
    ServerSettings, Settings, WatchdogSettings,
};
