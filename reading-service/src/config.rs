use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use time::UtcOffset;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Host used in image links when the request carries no `Host` header.
    pub public_host: String,
    pub images_dir: PathBuf,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl VisionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn api_key(&self) -> anyhow::Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| anyhow::anyhow!("vision API key variable {} is not set", self.api_key_env))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JanitorConfig {
    pub sweep_interval_secs: u64,
    pub image_ttl_secs: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            image_ttl_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingConfig {
    /// Offset from UTC, in minutes, at which billing months start.
    pub utc_offset_minutes: i32,
}

impl BillingConfig {
    pub fn utc_offset(&self) -> anyhow::Result<UtcOffset> {
        UtcOffset::from_whole_seconds(self.utc_offset_minutes.saturating_mul(60))
            .map_err(|e| anyhow::anyhow!("invalid billing.utc_offset_minutes: {e}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub vision: VisionConfig,
    #[serde(default)]
    pub janitor: JanitorConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    pub metrics: Option<MetricsConfig>,
}

fn default_max_body_bytes() -> usize {
    crate::handlers::DEFAULT_MAX_BODY_BYTES
}

fn default_vision_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_vision_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("READING_CONFIG").unwrap_or_else(|_| "reading-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
