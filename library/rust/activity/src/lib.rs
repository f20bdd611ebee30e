//! handcraft-activity: ユーザーアクティビティイベントの発行ライブラリ。
//!
//! アプリケーションの操作（プロジェクト作成、画像アップロードなど）を、Schema Registry に
//! 登録された Avro スキーマでエンコードし、永続ログのトピックへベストエフォートで送信する。
//!
//! - [`SchemaResolver`]: `<topic>-value` / `<topic>-key` サブジェクトのスキーマ ID を解決する
//! - [`SessionManager`]: ブローカー接続とスキーマ解決を起動時に一度だけ行う
//! - [`EventEncoder`]: キー/値を Registry 形式でフレーム化した Avro バイナリにする
//! - [`EventPublisher`]: `emit` を非ブロッキングで受け付け、バックグラウンドで送信する
//!
//! # 使用例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use handcraft_activity::{
//!     ActivityConfig, ActivityEmitter, ActivityEvent, ActivityType, EventPublisher,
//!     InMemoryBrokerClient, SchemaResolver, SessionManager,
//! };
//! use handcraft_schemaregistry::{HttpSchemaRegistryClient, SchemaRegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ActivityConfig::default();
//!     let registry = HttpSchemaRegistryClient::new(SchemaRegistryConfig::new(
//!         "http://schema-registry:8081",
//!     ))?;
//!     let resolver = SchemaResolver::new(Arc::new(registry), config.retry_config());
//!     let session = Arc::new(SessionManager::new(
//!         Arc::new(InMemoryBrokerClient::new()),
//!         resolver,
//!         "user_events_by_day",
//!     ));
//!     let publisher = EventPublisher::new(session.clone(), &config);
//!
//!     tokio::spawn(async move { session.start().await });
//!
//!     publisher.emit(&ActivityEvent::new("user-1", ActivityType::CreateProject));
//!     publisher.close().await;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
#[cfg(feature = "kafka")]
pub mod kafka_broker;
pub mod publisher;
pub mod resolver;
pub mod schema;
pub mod session;

pub use broker::{BrokerClient, InMemoryBrokerClient, SentMessage};
pub use codec::{EncodedMessage, EventEncoder};
pub use config::{ActivityConfig, KafkaConfig};
pub use error::{ActivityError, BrokerError, EncodingError};
pub use event::{ActivityEvent, ActivityType, EventKey, UnknownActivityType};
pub use publisher::{ActivityEmitter, EventPublisher, NoopActivityEmitter, StatsSnapshot};
pub use resolver::SchemaResolver;
pub use schema::{SchemaBinding, SchemaBindings};
pub use session::{SessionManager, SessionState};

#[cfg(feature = "kafka")]
pub use kafka_broker::KafkaBrokerClient;

#[cfg(any(test, feature = "mock"))]
pub use broker::MockBrokerClient;
#[cfg(any(test, feature = "mock"))]
pub use publisher::MockActivityEmitter;
