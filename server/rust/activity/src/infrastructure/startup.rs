use std::sync::Arc;

use handcraft_activity::{
    ActivityConfig, ActivityEmitter, BrokerClient, EventPublisher, KafkaBrokerClient,
    NoopActivityEmitter, SchemaResolver, SessionManager, SessionState,
};
use handcraft_schemaregistry::{HttpSchemaRegistryClient, SchemaRegistryClient};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::config::Config;

/// ActivityPipeline はイベント発行に必要なコンポーネント一式。
///
/// ブローカーまたは Schema Registry が未設定の場合は `session` を持たず、Noop で動作する。
pub struct ActivityPipeline {
    pub emitter: Arc<dyn ActivityEmitter>,
    pub session: Option<Arc<SessionManager>>,
}

impl ActivityPipeline {
    /// 設定からパイプラインを構築する。ネットワーク接続は `spawn_start` まで行わない。
    ///
    /// クライアントの生成に失敗してもホストプロセスは止めず、Noop にフォールバックする。
    pub fn from_config(cfg: &Config) -> Self {
        let (Some(kafka_cfg), Some(registry_cfg)) = (&cfg.kafka, &cfg.schema_registry) else {
            info!("kafka or schema registry not configured, using Noop activity emitter");
            return Self::noop();
        };

        info!(
            brokers = ?kafka_cfg.brokers,
            registry = %registry_cfg.url,
            topic = %kafka_cfg.topic,
            "initializing activity event pipeline"
        );
        let broker = match KafkaBrokerClient::new(kafka_cfg) {
            Ok(broker) => broker,
            Err(e) => {
                error!(error = %e, "failed to create kafka producer, activity events will be skipped");
                return Self::noop();
            }
        };
        let registry = match HttpSchemaRegistryClient::new(registry_cfg.clone()) {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "failed to create schema registry client, activity events will be skipped");
                return Self::noop();
            }
        };

        Self::assemble(
            Arc::new(broker),
            Arc::new(registry),
            &kafka_cfg.topic,
            &cfg.activity,
        )
    }

    /// 任意のブローカー・Registry 実装からパイプラインを組み立てる。
    pub fn assemble(
        broker: Arc<dyn BrokerClient>,
        registry: Arc<dyn SchemaRegistryClient>,
        topic: &str,
        activity: &ActivityConfig,
    ) -> Self {
        let resolver = SchemaResolver::new(registry, activity.retry_config());
        let session = Arc::new(SessionManager::new(broker, resolver, topic));
        let publisher = EventPublisher::new(session.clone(), activity);
        Self {
            emitter: Arc::new(publisher),
            session: Some(session),
        }
    }

    pub fn noop() -> Self {
        Self {
            emitter: Arc::new(NoopActivityEmitter::new()),
            session: None,
        }
    }

    /// セッションの起動をバックグラウンドで開始する。リスナーのバインドを待たせない。
    pub fn spawn_start(&self) -> Option<JoinHandle<SessionState>> {
        let session = self.session.clone()?;
        Some(tokio::spawn(async move { session.start().await }))
    }
}
