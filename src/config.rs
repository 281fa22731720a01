use crate::error::{config_error, env_error, ServiceResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_FILE: &str = "config/service.toml";

/// Longest meeting accepted, in minutes
pub const MAX_MEETING_DURATION: u32 = 24 * 60;

/// Which document store the service talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown store backend '{}'", other)),
        }
    }
}

/// Which meet provider generates join links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetProviderKind {
    Stub,
    Google,
}

impl FromStr for MeetProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(MeetProviderKind::Stub),
            "google" => Ok(MeetProviderKind::Google),
            other => Err(format!("Unknown meet provider '{}'", other)),
        }
    }
}

/// Main configuration structure for the service
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port the HTTP server binds to
    pub port: u16,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// Redis connection URL
    pub redis_url: String,
    /// Meet provider used for new meetings
    pub meet_provider: MeetProviderKind,
    /// Base URL for stub join links
    pub meet_base_url: String,
    /// Google Calendar API client ID
    pub google_client_id: Option<String>,
    /// Google Calendar API client secret
    pub google_client_secret: Option<String>,
    /// Google Calendar ID where meetings are created
    pub google_calendar_id: Option<String>,
    /// Timezone for local start times and calendar events
    pub timezone: String,
    /// Duration used when a request does not give one
    pub default_duration_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            store_backend: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            meet_provider: MeetProviderKind::Stub,
            meet_base_url: "https://meet.google.com".to_string(),
            google_client_id: None,
            google_client_secret: None,
            google_calendar_id: None,
            timezone: "UTC".to_string(),
            default_duration_minutes: 60,
        }
    }
}

/// Optional overrides read from the TOML configuration file
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub store_backend: Option<String>,
    pub redis_url: Option<String>,
    pub meet_provider: Option<String>,
    pub meet_base_url: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_calendar_id: Option<String>,
    pub timezone: Option<String>,
    pub default_duration_minutes: Option<u32>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> ServiceResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let path = env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let file = if Path::new(&path).exists() {
            let content = fs::read_to_string(&path)?;
            Some(toml::from_str::<FileConfig>(&content)?)
        } else {
            None
        };

        Self::from_sources(file, |key| env::var(key).ok())
    }

    /// Build configuration from defaults, file overrides and an environment lookup
    pub fn from_sources<F>(file: Option<FileConfig>, lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let file = file.unwrap_or_default();

        // File overrides
        if let Some(host) = file.host {
            config.host = host;
        }
        if let Some(port) = file.port {
            config.port = port;
        }
        if let Some(backend) = file.store_backend {
            config.store_backend = backend.parse().map_err(|e: String| config_error(&e))?;
        }
        if let Some(url) = file.redis_url {
            config.redis_url = url;
        }
        if let Some(provider) = file.meet_provider {
            config.meet_provider = provider.parse().map_err(|e: String| config_error(&e))?;
        }
        if let Some(base) = file.meet_base_url {
            config.meet_base_url = base;
        }
        config.google_client_id = file.google_client_id.or(config.google_client_id);
        config.google_client_secret = file.google_client_secret.or(config.google_client_secret);
        config.google_calendar_id = file.google_calendar_id.or(config.google_calendar_id);
        if let Some(tz) = file.timezone {
            config.timezone = tz;
        }
        if let Some(duration) = file.default_duration_minutes {
            config.default_duration_minutes = duration;
        }

        // Environment overrides
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port.parse().map_err(|_| env_error("PORT"))?;
        }
        if let Some(backend) = lookup("STORE_BACKEND") {
            config.store_backend = backend.parse().map_err(|_| env_error("STORE_BACKEND"))?;
        }
        if let Some(url) = lookup("REDIS_URL") {
            config.redis_url = url;
        }
        if let Some(provider) = lookup("MEET_PROVIDER") {
            config.meet_provider = provider.parse().map_err(|_| env_error("MEET_PROVIDER"))?;
        }
        if let Some(base) = lookup("MEET_BASE_URL") {
            config.meet_base_url = base;
        }
        if let Some(id) = lookup("GOOGLE_CLIENT_ID") {
            config.google_client_id = Some(id);
        }
        if let Some(secret) = lookup("GOOGLE_CLIENT_SECRET") {
            config.google_client_secret = Some(secret);
        }
        if let Some(calendar) = lookup("GOOGLE_CALENDAR_ID") {
            config.google_calendar_id = Some(calendar);
        }
        if let Some(tz) = lookup("TIMEZONE") {
            config.timezone = tz;
        }
        if let Some(duration) = lookup("DEFAULT_MEETING_DURATION") {
            config.default_duration_minutes = duration
                .parse()
                .map_err(|_| env_error("DEFAULT_MEETING_DURATION"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> ServiceResult<()> {
        self.tz()?;

        if self.default_duration_minutes == 0 || self.default_duration_minutes > MAX_MEETING_DURATION {
            return Err(config_error(&format!(
                "Default meeting duration must be between 1 and {} minutes",
                MAX_MEETING_DURATION
            )));
        }

        url::Url::parse(&self.meet_base_url)
            .map_err(|e| config_error(&format!("Invalid meet base URL: {}", e)))?;

        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> ServiceResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(None, |_| None).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.meet_provider, MeetProviderKind::Stub);
        assert_eq!(config.default_duration_minutes, 60);
        assert!(config.google_calendar_id.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 8081
            timezone = "Europe/Helsinki"
            meet_provider = "google"
            google_calendar_id = "file-calendar"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            Some(file),
            lookup_from(&[("PORT", "9000"), ("GOOGLE_CALENDAR_ID", "env-calendar")]),
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.timezone, "Europe/Helsinki");
        assert_eq!(config.meet_provider, MeetProviderKind::Google);
        assert_eq!(config.google_calendar_id.as_deref(), Some("env-calendar"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = Config::from_sources(None, lookup_from(&[("TIMEZONE", "  ")])).unwrap();
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_sources(None, lookup_from(&[("TIMEZONE", "Mars/Olympus")])).is_err());
        assert!(Config::from_sources(None, lookup_from(&[("PORT", "http")])).is_err());
        assert!(Config::from_sources(None, lookup_from(&[("STORE_BACKEND", "mongo")])).is_err());
        assert!(
            Config::from_sources(None, lookup_from(&[("DEFAULT_MEETING_DURATION", "0")])).is_err()
        );
        assert!(
            Config::from_sources(None, lookup_from(&[("DEFAULT_MEETING_DURATION", "1441")])).is_err()
        );
    }
}
