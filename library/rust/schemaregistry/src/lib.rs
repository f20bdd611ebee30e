//! handcraft-schemaregistry: Confluent 互換 Schema Registry クライアントライブラリ。
//!
//! イベントストリームのキー/値サブジェクトに対する Avro スキーマの取得・登録を提供する。
//!
//! # 使用例
//!
//! ```rust,no_run
//! use handcraft_schemaregistry::{
//!     HttpSchemaRegistryClient, SchemaRegistryClient, SchemaRegistryConfig, SubjectRole,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SchemaRegistryConfig::new("http://schema-registry:8081");
//!     let client = HttpSchemaRegistryClient::new(config)?;
//!
//!     let subject = SubjectRole::Value.subject("user_events_by_day");
//!     let latest = client.get_latest_schema(&subject).await?;
//!
//!     println!("latest schema id={}", latest.id);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod schema;

pub use client::{HttpSchemaRegistryClient, SchemaRegistryClient};
pub use config::{SchemaRegistryConfig, SubjectRole};
pub use error::SchemaRegistryError;
pub use schema::{RegisteredSchema, SchemaType};

#[cfg(any(test, feature = "mock"))]
pub use client::MockSchemaRegistryClient;
