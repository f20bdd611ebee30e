//! KafkaBrokerClient: rdkafka を使用した BrokerClient 実装。
//! feature = "kafka" で有効化される。

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};

use crate::broker::BrokerClient;
use crate::config::KafkaConfig;
use crate::error::BrokerError;

/// KafkaBrokerClient は rdkafka の FutureProducer を使ったブローカークライアント。
pub struct KafkaBrokerClient {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaBrokerClient {
    /// KafkaConfig からプロデューサーを生成する。ネットワーク接続は `connect` まで行わない。
    pub fn new(config: &KafkaConfig) -> Result<Self, BrokerError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("client.id", &config.client_id)
            .set("security.protocol", &config.security_protocol)
            .set("acks", "all")
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Self {
            producer,
            timeout: Duration::from_millis(config.message_timeout_ms),
        })
    }
}

#[async_trait]
impl BrokerClient for KafkaBrokerClient {
    async fn connect(&self) -> Result<(), BrokerError> {
        // メタデータ取得はブロッキング呼び出しのため専用スレッドで実行する
        let producer = self.producer.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || producer.client().fetch_metadata(None, timeout))
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn send(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<(), BrokerError> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, self.timeout)
            .await
            .map_err(|(err, _)| BrokerError::Send(err.to_string()))?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), BrokerError> {
        let producer = self.producer.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| BrokerError::Send(e.to_string()))?
            .map_err(|e| BrokerError::Send(e.to_string()))
    }
}
