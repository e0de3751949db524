//! Config file at `$XDG_CONFIG_HOME/fieldsync/config.toml`, written with defaults on first run.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `route.api_key`.
pub const ROUTE_API_KEY_ENV: &str = "FIELDSYNC_ROUTE_API_KEY";

/// Retry budget for one job class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempt count at which transient failures become terminal.
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff between invocations.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl RetryConfig {
    fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_secs: 10.0,
            max_delay_secs: 300,
        }
    }
}

/// Retry budgets per job class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRetryConfig {
    pub sync: RetryConfig,
    pub location: RetryConfig,
    pub upload: RetryConfig,
}

impl Default for JobRetryConfig {
    fn default() -> Self {
        Self {
            sync: RetryConfig::with_attempts(3),
            location: RetryConfig::with_attempts(3),
            upload: RetryConfig::with_attempts(5),
        }
    }
}

/// Routing service used by `HttpRouteFetcher`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteServiceConfig {
    /// Base URL of an OSRM-compatible routing service.
    pub base_url: String,
    /// Routing profile path segment (e.g. "driving").
    pub profile: String,
    /// API key appended as `key=` when set. Prefer the environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RouteServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// One named sync sub-task backed by an HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEndpoint {
    pub name: String,
    pub url: String,
}

/// Data sync job settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Bounded wait per sub-task, in seconds.
    pub subtask_timeout_secs: u64,
    /// Sub-tasks in execution order.
    #[serde(default)]
    pub endpoints: Vec<SyncEndpoint>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            subtask_timeout_secs: 60,
            endpoints: Vec::new(),
        }
    }
}

/// Connectivity precondition check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `host:port` the TCP probe connects to.
    pub probe_addr: String,
    /// Probe connect timeout in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_addr: "1.1.1.1:443".to_string(),
            probe_timeout_ms: 1500,
        }
    }
}

/// Global configuration loaded from `~/.config/fieldsync/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsyncConfig {
    /// Maximum stops per routing request (including the continuity stop).
    pub chunk_limit: usize,
    /// Chunk requests in flight at once; 1 fetches sequentially.
    pub fetch_concurrency: usize,
    /// Endpoint receiving location reports (POST JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_endpoint: Option<String>,
    /// Endpoint receiving file uploads (POST body).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_endpoint: Option<String>,
    #[serde(default)]
    pub route: RouteServiceConfig,
    #[serde(default)]
    pub retry: JobRetryConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Default for FieldsyncConfig {
    fn default() -> Self {
        Self {
            chunk_limit: 20,
            fetch_concurrency: 1,
            location_endpoint: None,
            upload_endpoint: None,
            route: RouteServiceConfig::default(),
            retry: JobRetryConfig::default(),
            sync: SyncConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl FieldsyncConfig {
    pub fn subtask_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.subtask_timeout_secs)
    }

    /// Route API key, preferring the environment over the file.
    pub fn route_api_key(&self) -> Option<String> {
        std::env::var(ROUTE_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.route.api_key.clone())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fieldsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FieldsyncConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<FieldsyncConfig> {
    if !path.exists() {
        let default_cfg = FieldsyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: FieldsyncConfig = toml::from_str(&data)?;
    Ok(cfg)
}
