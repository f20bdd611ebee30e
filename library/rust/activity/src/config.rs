use std::time::Duration;

use handcraft_retry::RetryConfig;
use serde::{Deserialize, Serialize};

/// ActivityConfig はイベント発行パイプラインの調整値を表す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// 起動時スキーマ解決の最大試行回数
    #[serde(default = "default_resolve_max_attempts")]
    pub resolve_max_attempts: u32,
    /// 試行間の固定待機時間（ミリ秒）
    #[serde(default = "default_resolve_retry_delay_ms")]
    pub resolve_retry_delay_ms: u64,
    /// 送信待ちキューの容量。満杯時は新しいイベントを破棄する。
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// 同時送信数の上限
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// 1 メッセージあたりの送信タイムアウト（ミリ秒）
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// metadata_json の最大バイト数
    #[serde(default = "default_max_metadata_bytes")]
    pub max_metadata_bytes: usize,
}

fn default_resolve_max_attempts() -> u32 {
    20
}

fn default_resolve_retry_delay_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_in_flight() -> usize {
    64
}

fn default_send_timeout_ms() -> u64 {
    5000
}

fn default_max_metadata_bytes() -> usize {
    64 * 1024
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            resolve_max_attempts: default_resolve_max_attempts(),
            resolve_retry_delay_ms: default_resolve_retry_delay_ms(),
            queue_capacity: default_queue_capacity(),
            max_in_flight: default_max_in_flight(),
            send_timeout_ms: default_send_timeout_ms(),
            max_metadata_bytes: default_max_metadata_bytes(),
        }
    }
}

impl ActivityConfig {
    /// スキーマ解決用の固定間隔リトライ設定を返す。
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::fixed(
            self.resolve_max_attempts,
            Duration::from_millis(self.resolve_retry_delay_ms),
        )
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// KafkaConfig は Kafka ブローカー接続の設定を表す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Kafka ブローカーアドレスのリスト（例: ["kafka-broker:29092"]）
    pub brokers: Vec<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// セキュリティプロトコル（PLAINTEXT / SSL / SASL_PLAINTEXT / SASL_SSL）
    #[serde(default = "default_security_protocol")]
    pub security_protocol: String,
    /// 発行先トピック。Schema Registry のサブジェクト名の語幹も兼ねる。
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
}

fn default_client_id() -> String {
    "handcraft-activity".to_string()
}

fn default_security_protocol() -> String {
    "PLAINTEXT".to_string()
}

fn default_topic() -> String {
    "user_events_by_day".to_string()
}

fn default_message_timeout_ms() -> u64 {
    5000
}

impl KafkaConfig {
    /// ブローカーアドレスをカンマ区切り文字列で返す（rdkafka の bootstrap.servers 用）。
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_config_defaults() {
        let cfg = ActivityConfig::default();
        assert_eq!(cfg.resolve_max_attempts, 20);
        assert_eq!(cfg.resolve_retry_delay_ms, 1000);
        assert_eq!(cfg.queue_capacity, 1024);
        assert_eq!(cfg.max_in_flight, 64);
        assert_eq!(cfg.send_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.max_metadata_bytes, 65536);
    }

    #[test]
    fn test_retry_config_is_fixed() {
        let retry = ActivityConfig::default().retry_config();
        assert_eq!(retry.max_attempts, 20);
        assert_eq!(retry.compute_delay(0), Duration::from_secs(1));
        assert_eq!(retry.compute_delay(18), Duration::from_secs(1));
    }

    #[test]
    fn test_kafka_config_deserialize_defaults() {
        let json = r#"{"brokers": ["kafka-0:9092", "kafka-1:9092"]}"#;
        let cfg: KafkaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bootstrap_servers(), "kafka-0:9092,kafka-1:9092");
        assert_eq!(cfg.topic, "user_events_by_day");
        assert_eq!(cfg.security_protocol, "PLAINTEXT");
        assert_eq!(cfg.client_id, "handcraft-activity");
        assert_eq!(cfg.message_timeout_ms, 5000);
    }

    #[test]
    fn test_activity_config_partial_override() {
        let json = r#"{"queue_capacity": 8, "max_in_flight": 2}"#;
        let cfg: ActivityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.queue_capacity, 8);
        assert_eq!(cfg.max_in_flight, 2);
        assert_eq!(cfg.resolve_max_attempts, 20);
    }
}
