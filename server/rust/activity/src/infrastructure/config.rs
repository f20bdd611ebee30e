use handcraft_activity::{ActivityConfig, KafkaConfig};
use handcraft_schemaregistry::SchemaRegistryConfig;
use serde::Deserialize;

/// Application configuration for activity server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    /// 未設定の場合はイベント発行を行わない
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,
    /// 未設定の場合はイベント発行を行わない
    #[serde(default)]
    pub schema_registry: Option<SchemaRegistryConfig>,
    #[serde(default)]
    pub activity: ActivityConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// TelemetrySettings はログ出力の設定を表す。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetrySettings {
    /// 未指定の場合は環境名から決める（dev: debug / staging: info / その他: warn）
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_format() -> String {
    "json".to_string()
}

impl TelemetrySettings {
    pub fn log_level_for(&self, environment: &str) -> String {
        self.log_level.clone().unwrap_or_else(|| {
            handcraft_telemetry::logger::level_for_environment(environment).to_string()
        })
    }
}
