//! Bot configuration
//!
//! Loaded from a JSON file, then overlaid by `SAMTICH_*` environment
//! variables and finally by command line flags.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use samtich_core::{ChatId, SurveySettings};

use crate::{GatewayError, Result, DEFAULT_HOST, DEFAULT_PORT};

pub const ENV_BOT_TOKEN: &str = "SAMTICH_BOT_TOKEN";
pub const ENV_ADMIN_IDS: &str = "SAMTICH_ADMIN_IDS";
pub const ENV_PHOTO_IDS: &str = "SAMTICH_PHOTO_IDS";
pub const ENV_DATA_FILE: &str = "SAMTICH_DATA_FILE";

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_CHANNEL_URL: &str = "https://t.me/sam_tich";
pub const DEFAULT_DATA_FILE: &str = "results.json";

/// Upper bound for session timeout and sweep interval (about ten years)
pub const MAX_SESSION_SECS: u64 = 10 * 365 * 86_400;

/// Upper bound for the long-polling timeout
pub const MAX_POLL_TIMEOUT_SECS: u64 = 600;

/// Main bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot API access
    pub telegram: TelegramSettings,

    /// Chats that receive a summary of every response
    pub admin_ids: Vec<i64>,

    /// Photo file ids; the album shows the first two
    pub photo_ids: Vec<String>,

    /// Response store path
    pub data_file: PathBuf,

    /// Link on the thank-you button
    pub channel_url: String,

    /// Session expiry
    pub session: SessionSettings,

    /// Health/status endpoint
    pub http: HttpSettings,

    /// Answer photo messages with their file ids
    pub echo_photo_ids: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            admin_ids: Vec::new(),
            photo_ids: Vec::new(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            channel_url: DEFAULT_CHANNEL_URL.to_string(),
            session: SessionSettings::default(),
            http: HttpSettings::default(),
            echo_photo_ids: true,
        }
    }
}

impl BotConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.telegram.token = token.into();
        self
    }

    pub fn with_admins(mut self, admins: Vec<i64>) -> Self {
        self.admin_ids = admins;
        self
    }

    pub fn with_photos(mut self, photos: Vec<String>) -> Self {
        self.photo_ids = photos;
        self
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Set the status endpoint address
    pub fn with_http(mut self, host: impl Into<String>, port: u16) -> Self {
        self.http.host = host.into();
        self.http.port = port;
        self
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; unset or blank variables keep the
    /// current value
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.telegram.token = token.trim().to_string();
        }
        if let Some(admins) = get(ENV_ADMIN_IDS) {
            self.admin_ids = parse_id_list(&admins)?;
        }
        if let Some(photos) = get(ENV_PHOTO_IDS) {
            self.photo_ids = parse_list(&photos);
        }
        if let Some(path) = get(ENV_DATA_FILE) {
            self.data_file = PathBuf::from(path.trim());
        }
        Ok(self)
    }

    /// Check the settings needed to run the bot
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(format!(
                "bot token is empty (set {} or telegram.token)",
                ENV_BOT_TOKEN
            )));
        }
        if self.photo_ids.is_empty() {
            return Err(GatewayError::InvalidConfig(format!(
                "photo pool is empty (set {} or photo_ids)",
                ENV_PHOTO_IDS
            )));
        }
        let channel = url::Url::parse(&self.channel_url).map_err(|e| {
            GatewayError::InvalidConfig(format!("channel_url {:?}: {}", self.channel_url, e))
        })?;
        if !matches!(channel.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidConfig(format!(
                "channel_url must be an http(s) link, got {:?}",
                self.channel_url
            )));
        }
        url::Url::parse(&self.telegram.api_base).map_err(|e| {
            GatewayError::InvalidConfig(format!("telegram.api_base {:?}: {}", self.telegram.api_base, e))
        })?;
        if self.session.timeout_secs > MAX_SESSION_SECS {
            return Err(GatewayError::InvalidConfig(format!(
                "session.timeout_secs {} exceeds {}",
                self.session.timeout_secs, MAX_SESSION_SECS
            )));
        }
        if !(1..=MAX_SESSION_SECS).contains(&self.session.sweep_interval_secs) {
            return Err(GatewayError::InvalidConfig(format!(
                "session.sweep_interval_secs must be between 1 and {}, got {}",
                MAX_SESSION_SECS, self.session.sweep_interval_secs
            )));
        }
        if self.telegram.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(GatewayError::InvalidConfig(format!(
                "telegram.poll_timeout_secs {} exceeds {}",
                self.telegram.poll_timeout_secs, MAX_POLL_TIMEOUT_SECS
            )));
        }
        if self.admin_ids.is_empty() {
            tracing::warn!("No admin ids configured, responses will only be stored");
        }
        Ok(())
    }

    /// Status endpoint address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse()
            .map_err(|e| GatewayError::InvalidConfig(format!("http address: {}", e)))
    }

    /// Idle timeout, `None` when expiry is disabled. Values past
    /// [`MAX_SESSION_SECS`] are clamped; `validate` rejects them.
    pub fn session_timeout(&self) -> Option<chrono::Duration> {
        if self.session.timeout_secs == 0 {
            return None;
        }
        let secs = i64::try_from(self.session.timeout_secs.min(MAX_SESSION_SECS)).ok()?;
        chrono::Duration::try_seconds(secs)
    }

    /// Sweep period for idle sessions
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session.sweep_interval_secs.clamp(1, MAX_SESSION_SECS))
    }

    /// Settings handed to the survey engine
    pub fn survey_settings(&self) -> SurveySettings {
        SurveySettings {
            photo_pool: self.photo_ids.clone(),
            admins: self.admin_ids.iter().copied().map(ChatId).collect(),
            channel_url: self.channel_url.clone(),
            echo_photo_ids: self.echo_photo_ids,
        }
    }
}

/// Bot API settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot token from @BotFather
    pub token: String,

    /// API root, without the `/bot<token>` part
    pub api_base: String,

    /// Long-polling timeout in seconds
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &if self.token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Idle time after which a session is dropped; 0 keeps sessions forever
    pub timeout_secs: u64,

    /// How often expired sessions are swept
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 86_400, // 1 day
            sweep_interval_secs: 300,
        }
    }
}

/// Health/status HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Parse a comma separated list of chat ids
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    parse_list(raw)
        .iter()
        .map(|id| {
            id.parse::<i64>()
                .map_err(|e| GatewayError::InvalidConfig(format!("bad chat id {:?}: {}", id, e)))
        })
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
