//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file and defines
//! constants for display limits, placeholder strings, cache headers and
//! default paths. `AppConfig` is the root configuration struct; `BuildInfo`
//! holds the build-time metadata read from the environment once at startup.

use const_format::formatcp;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// The status page embeds the server time, so nothing may cache it
pub const CACHE_CONTROL_STATUS: &str = "no-store";

/// Error responses - short TTL so a reverse proxy retries quickly
pub const HTTP_CACHE_ERROR_MAX_AGE: u32 = 5;

pub const CACHE_CONTROL_ERROR: &str = formatcp!("public, max-age={}", HTTP_CACHE_ERROR_MAX_AGE);

// =============================================================================
// Display Constants
// =============================================================================

/// Length of a short identifier (container ID, image ID)
pub const SHORT_ID_LEN: usize = 12;

/// Commits longer than this are shortened on the status page
pub const COMMIT_DISPLAY_LEN: usize = 12;

/// Characters of the repository digest kept before the ellipsis
pub const DIGEST_DISPLAY_LEN: usize = 19;

/// Environment values longer than this are truncated on the status page
pub const VALUE_DISPLAY_MAX: usize = 60;

/// Characters kept from a truncated environment value
pub const VALUE_DISPLAY_KEEP: usize = VALUE_DISPLAY_MAX - 3;

/// Marker appended to truncated values
pub const ELLIPSIS: &str = "…";

/// Format for the "Server Time (UTC)" row
pub const SERVER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Placeholder Strings
// =============================================================================

/// Build metadata that was not provided at image build time
pub const UNKNOWN: &str = "unknown";

/// Runtime metadata the container daemon could not provide
pub const UNAVAILABLE: &str = "unavailable";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Control group membership file of the current process
pub const DEFAULT_CGROUP_PATH: &str = "/proc/self/cgroup";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "buildstamp=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Matches the Docker client's own default request timeout
pub const DEFAULT_DOCKER_TIMEOUT_SECS: u64 = 120;

/// Environment variables shown in the "Container Environment" card, in order
pub const DEFAULT_ENV_KEYS: &[&str] = &[
    "GIT_COMMIT",
    "IMAGE_NAME",
    "BUILD_DATE",
    "HOSTNAME",
    "PATH",
    "LANG",
    "LC_ALL",
    "HOME",
    "RUST_LOG",
    "BUILDSTAMP_ARGS",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Container daemon lookup
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Curated environment table
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HTTP_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_HTTP_PORT
    }
}

/// Connection settings for the container-management daemon
#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// Set to false to skip the daemon lookup entirely
    #[serde(default = "DockerConfig::default_enabled")]
    pub enabled: bool,
    /// Socket path or URL. When unset, DOCKER_HOST or the platform socket is used.
    pub socket: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "DockerConfig::default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            socket: None,
            timeout_seconds: Self::default_timeout(),
        }
    }
}

impl DockerConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_timeout() -> u64 {
        DEFAULT_DOCKER_TIMEOUT_SECS
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Control group file scanned for the container ID
    #[serde(default = "IdentityConfig::default_cgroup_path")]
    pub cgroup_path: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cgroup_path: Self::default_cgroup_path(),
        }
    }
}

impl IdentityConfig {
    fn default_cgroup_path() -> PathBuf {
        PathBuf::from(DEFAULT_CGROUP_PATH)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    #[serde(default = "UiConfig::default_title")]
    pub title: String,
    #[serde(default = "UiConfig::default_heading")]
    pub heading: String,
    /// Deployment badge next to the heading (e.g. "Production")
    #[serde(default = "UiConfig::default_badge")]
    pub badge: String,
    /// Name of the reverse proxy in front of this service
    #[serde(default = "UiConfig::default_reverse_proxy")]
    pub reverse_proxy: String,
    #[serde(default = "UiConfig::default_footer")]
    pub footer: String,
    /// Version string, populated at runtime
    #[serde(skip_deserializing, default = "UiConfig::default_version")]
    pub version: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            heading: Self::default_heading(),
            badge: Self::default_badge(),
            reverse_proxy: Self::default_reverse_proxy(),
            footer: Self::default_footer(),
            version: Self::default_version(),
        }
    }
}

impl UiConfig {
    fn default_title() -> String {
        "Buildstamp".to_string()
    }

    fn default_heading() -> String {
        "Buildstamp".to_string()
    }

    fn default_badge() -> String {
        "Production".to_string()
    }

    fn default_reverse_proxy() -> String {
        "Caddy".to_string()
    }

    fn default_footer() -> String {
        "Served by buildstamp behind a reverse proxy".to_string()
    }

    fn default_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Variable names shown on the status page, in display order
    #[serde(default = "EnvironmentConfig::default_keys")]
    pub keys: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            keys: Self::default_keys(),
        }
    }
}

impl EnvironmentConfig {
    fn default_keys() -> Vec<String> {
        DEFAULT_ENV_KEYS.iter().map(|k| k.to_string()).collect()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }

        if self.docker.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "docker.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if self.identity.cgroup_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "identity.cgroup_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Build metadata baked into the image as environment variables.
///
/// Read once at process start and passed to handlers through `AppState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub image_name: String,
    pub git_commit: String,
    pub build_date: String,
}

impl BuildInfo {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; missing values become "unknown".
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            image_name: read("IMAGE_NAME"),
            git_commit: read("GIT_COMMIT"),
            build_date: read("BUILD_DATE"),
        }
    }
}
