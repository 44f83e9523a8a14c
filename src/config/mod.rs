use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub members: MembersConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Full SQLite URL; overrides `data_dir` when set
    #[serde(default)]
    pub database_url: Option<String>,
    /// Expose internal error details in 500 responses (development only)
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            database_url: None,
            debug: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a session token in hours (default: 7 days)
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default)]
    pub password: PasswordPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            password: PasswordPolicy::default(),
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

/// Password strength requirements applied at registration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PasswordPolicy {
    #[serde(default = "default_password_min_length")]
    pub min_length: usize,
    #[serde(default = "default_true")]
    pub require_mixed_case: bool,
    #[serde(default = "default_true")]
    pub require_digit: bool,
    #[serde(default)]
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: default_password_min_length(),
            require_mixed_case: true,
            require_digit: true,
            require_symbol: false,
        }
    }
}

fn default_password_min_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: i64,
    #[serde(default = "default_min_per_page")]
    pub min_per_page: i64,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: i64,
    /// Window used by the expiring-memberships listing when no `days` is given
    #[serde(default = "default_expiring_within_days")]
    pub expiring_within_days: i64,
}

impl Default for MembersConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            min_per_page: default_min_per_page(),
            max_per_page: default_max_per_page(),
            expiring_within_days: default_expiring_within_days(),
        }
    }
}

impl MembersConfig {
    /// Clamp a requested page size into the configured range
    pub fn clamp_per_page(&self, requested: Option<i64>) -> i64 {
        let min = self.min_per_page.max(1);
        let max = self.max_per_page.max(min);
        requested.unwrap_or(self.default_per_page).clamp(min, max)
    }
}

fn default_per_page() -> i64 {
    15
}

fn default_min_per_page() -> i64 {
    5
}

fn default_max_per_page() -> i64 {
    100
}

fn default_expiring_within_days() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests per window for authenticated API endpoints
    #[serde(default = "default_api_requests")]
    pub api_requests_per_window: u32,
    /// Requests per window for register/login
    #[serde(default = "default_auth_requests")]
    pub auth_requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between sweeps of stale limiter entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_requests_per_window: default_api_requests(),
            auth_requests_per_window: default_auth_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

fn default_api_requests() -> u32 {
    120
}

fn default_auth_requests() -> u32 {
    20
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            members: MembersConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        config.check()?;
        Ok(config)
    }

    /// Reject settings that cannot work together
    pub fn check(&self) -> Result<()> {
        if self.members.min_per_page < 1 {
            anyhow::bail!("members.min_per_page must be at least 1");
        }
        if self.members.max_per_page < self.members.min_per_page {
            anyhow::bail!("members.max_per_page must not be below members.min_per_page");
        }
        if self.auth.session_ttl_hours <= 0 {
            anyhow::bail!("auth.session_ttl_hours must be positive");
        }
        if self.auth.password.min_length == 0 {
            anyhow::bail!("auth.password.min_length must be positive");
        }
        Ok(())
    }

    /// SQLite URL for the configured database
    pub fn database_url(&self) -> String {
        match &self.server.database_url {
            Some(url) => url.clone(),
            None => format!(
                "sqlite:{}?mode=rwc",
                self.server.data_dir.join("gymdesk.db").display()
            ),
        }
    }
}
