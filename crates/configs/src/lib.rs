//! # configs
//!
//! Runtime settings for the forum board. Values come from, in increasing
//! priority: built-in defaults, `config/forum.{toml,yaml,json}` (optional),
//! and `FORUM_*` environment variables with `__` between nested keys, e.g.
//! `FORUM_PAGE_LOAD__IDENTITY_ATTEMPTS=3`. A `.env` file is honoured.

use std::net::SocketAddr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "FORUM";
pub const DEFAULT_CONFIG_FILE: &str = "config/forum";

#[derive(Debug, Error)]
pub enum ConfigsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub board: BoardSettings,
    pub page_load: PageLoadSettings,
    pub online: OnlineSettings,
    pub dates: DateSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl ServerSettings {
    /// True when `bind_addr` only accepts local connections.
    pub fn is_loopback(&self) -> bool {
        match self.bind_addr.parse::<SocketAddr>() {
            Ok(addr) => addr.ip().is_loopback(),
            Err(_) => self
                .bind_addr
                .rsplit_once(':')
                .is_some_and(|(host, _)| host.eq_ignore_ascii_case("localhost")),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub id: i32,
    /// Display name of the anonymous user; `None` disables guest access.
    pub guest_name: Option<String>,
    /// Identity seeded as host administrator at startup.
    pub admin_identity: Option<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            id: 1,
            guest_name: Some("Guest".into()),
            admin_identity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageLoadSettings {
    /// Lookups under the authenticated identity before falling back to guest.
    pub identity_attempts: u32,
    /// Path fragment marking resource endpoints that are not tracked as pages.
    pub resource_marker: String,
    /// Header set by the trusted front end with the authenticated identity.
    /// Trusted verbatim: the server must not be reachable except through a
    /// front end that overwrites it on every request.
    pub user_header: String,
    pub session_cookie: String,
}

impl Default for PageLoadSettings {
    fn default() -> Self {
        Self {
            identity_attempts: 2,
            resource_marker: "/resource/".into(),
            user_header: "x-authenticated-user".into(),
            session_cookie: "forum_session".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OnlineSettings {
    pub active_minutes: i64,
}

impl Default for OnlineSettings {
    fn default() -> Self {
        Self { active_minutes: 15 }
    }
}

/// strftime patterns; see `services::DateFormats` for the defaults' meaning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DateSettings {
    pub utc_offset_minutes: i32,
    pub date_short: String,
    pub date_long: String,
    pub time: String,
    pub date_time: String,
    pub date_time_short: String,
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            date_short: "%Y-%m-%d".into(),
            date_long: "%A, %B %-d, %Y".into(),
            time: "%H:%M".into(),
            date_time: "%B %-d, %Y %H:%M".into(),
            date_time_short: "%Y-%m-%d %H:%M".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug".into(),
            json: false,
        }
    }
}

impl Settings {
    /// Loads `.env`, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigsError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_sources(DEFAULT_CONFIG_FILE, Environment::with_prefix(ENV_PREFIX))
    }

    /// Layers `file` (optional, any format `config` understands) and `env`
    /// over the defaults, then validates.
    pub fn from_sources(file: &str, env: Environment) -> Result<Self, ConfigsError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigsError> {
        if self.page_load.identity_attempts == 0 {
            return Err(ConfigsError::Invalid {
                key: "page_load.identity_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.page_load.user_header.trim().is_empty() {
            return Err(ConfigsError::Invalid {
                key: "page_load.user_header",
                reason: "must not be empty".into(),
            });
        }
        if self.page_load.session_cookie.trim().is_empty() {
            return Err(ConfigsError::Invalid {
                key: "page_load.session_cookie",
                reason: "must not be empty".into(),
            });
        }
        if self.online.active_minutes <= 0 {
            return Err(ConfigsError::Invalid {
                key: "online.active_minutes",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}
