use std::sync::Arc;

use handcraft_retry::{with_retry, RetryConfig};
use handcraft_schemaregistry::{
    SchemaRegistryClient, SchemaRegistryError, SchemaType, SubjectRole,
};
use tracing::{debug, info};

use crate::error::ActivityError;
use crate::schema::{SchemaBinding, SchemaBindings, KEY_SCHEMA, VALUE_SCHEMA};

/// SchemaResolver はストリームのキー/値サブジェクトを Registry 上のスキーマ ID に解決する。
///
/// 最新バージョンが存在すればそれを使い、サブジェクト未登録の場合のみ同梱スキーマを登録する。
/// それ以外の失敗は解決処理全体を固定間隔でリトライする。
pub struct SchemaResolver {
    registry: Arc<dyn SchemaRegistryClient>,
    retry: RetryConfig,
    key_schema: String,
    value_schema: String,
}

impl SchemaResolver {
    pub fn new(registry: Arc<dyn SchemaRegistryClient>, retry: RetryConfig) -> Self {
        Self {
            registry,
            retry,
            key_schema: KEY_SCHEMA.to_string(),
            value_schema: VALUE_SCHEMA.to_string(),
        }
    }

    /// 値サブジェクト未登録時に登録するスキーマ定義を差し替える。
    pub fn with_value_schema(mut self, definition: impl Into<String>) -> Self {
        self.value_schema = definition.into();
        self
    }

    /// キーサブジェクト未登録時に登録するスキーマ定義を差し替える。
    pub fn with_key_schema(mut self, definition: impl Into<String>) -> Self {
        self.key_schema = definition.into();
        self
    }

    /// `stream` のキー/値スキーマを解決する。リトライ上限に達した場合のみ失敗する。
    pub async fn resolve(&self, stream: &str) -> Result<SchemaBindings, ActivityError> {
        let bindings = with_retry(&self.retry, || self.resolve_once(stream))
            .await
            .map_err(|e| {
                let attempts = self.retry.max_attempts.max(1);
                ActivityError::ResolveExhausted {
                    attempts,
                    last_error: e.into_last_error().to_string(),
                }
            })?;

        info!(
            stream,
            key_schema_id = bindings.key_schema_id(),
            value_schema_id = bindings.value_schema_id(),
            "schema ids resolved"
        );
        Ok(bindings)
    }

    async fn resolve_once(&self, stream: &str) -> Result<SchemaBindings, ActivityError> {
        let value_subject = SubjectRole::Value.subject(stream);
        let key_subject = SubjectRole::Key.subject(stream);

        let value = self.resolve_subject(&value_subject, &self.value_schema).await?;
        let key = self.resolve_subject(&key_subject, &self.key_schema).await?;
        Ok(SchemaBindings { key, value })
    }

    async fn resolve_subject(
        &self,
        subject: &str,
        definition: &str,
    ) -> Result<SchemaBinding, SchemaRegistryError> {
        match self.registry.get_latest_schema(subject).await {
            Ok(latest) => {
                debug!(subject, id = latest.id, version = latest.version, "latest schema found");
                SchemaBinding::parse(latest.id, &latest.schema)
            }
            Err(e) if e.is_not_found() => {
                let binding = SchemaBinding::parse(0, definition)?;
                let id = self
                    .registry
                    .register_schema(subject, definition, SchemaType::Avro)
                    .await?;
                info!(subject, id, "schema registered");
                Ok(SchemaBinding { id, ..binding })
            }
            Err(e) => Err(e),
        }
    }
}
