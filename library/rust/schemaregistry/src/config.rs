use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Schema Registry 接続設定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistryConfig {
    /// ベース URL（例: `http://schema-registry:8081`）。
    pub url: String,

    /// 1 リクエストあたりのタイムアウト（秒）。
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl SchemaRegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// トピックに対するサブジェクトの役割。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectRole {
    Key,
    Value,
}

impl SubjectRole {
    /// TopicNameStrategy に従ったサブジェクト名（`<topic>-key` / `<topic>-value`）。
    pub fn subject(self, topic: &str) -> String {
        let suffix = match self {
            SubjectRole::Key => "key",
            SubjectRole::Value => "value",
        };
        format!("{topic}-{suffix}")
    }
}
