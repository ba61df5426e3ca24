use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::transcribe::chunks::DEFAULT_CHUNK_SIZE;

pub const API_KEY_ENV: &str = "AUDIOSCRIBE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub polling: PollingConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub backoff_factor: f64,
    pub max_interval_secs: u64,
    /// 0 disables the limit.
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

// --- Default implementations ---

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com/v2".to_string(),
            api_key: String::new(),
            request_timeout_secs: 300,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            backoff_factor: 1.0,
            max_interval_secs: 300,
            max_attempts: 240,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl ApiConfig {
    /// Config value first, then the environment.
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => anyhow::bail!(
                "API key not configured. Set [api] api_key or {}",
                API_KEY_ENV
            ),
        }
    }
}

// --- Config loading ---

/// Default location used by `init-config`, e.g. ~/.config/audioscribe/config.toml.
pub fn platform_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("audioscribe").join("config.toml"))
}

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(p) = exe_path.parent().map(|p| p.join("audioscribe.toml")) {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Platform config directory
        if let Some(p) = platform_config_path() {
            if p.exists() {
                let content = std::fs::read_to_string(&p)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(p)));
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        format!(
r#"# audioscribe configuration

[api]
# Base URL of the transcription API (AssemblyAI v2 compatible).
base_url = "https://api.assemblyai.com/v2"
# API key (or set {env} environment variable).
# api_key = ""
# Timeout for a single HTTP request, in seconds. Uploads of large files count
# as one request.
request_timeout_secs = 300

[upload]
# Bytes read from disk per upload chunk (5 MiB).
chunk_size = {chunk}

[polling]
# Seconds to wait between status checks.
interval_secs = 30
# Multiplier applied to the wait after each check. 1.0 keeps it fixed.
backoff_factor = 1.0
# Upper bound on a single wait, in seconds.
max_interval_secs = 300
# Give up after this many status checks. 0 polls forever.
max_attempts = 240

[output]
# Directory where <title>.txt transcripts are written.
directory = "."
"#,
            env = API_KEY_ENV,
            chunk = DEFAULT_CHUNK_SIZE,
        )
    }
}
