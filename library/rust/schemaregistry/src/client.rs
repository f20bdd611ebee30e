use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SchemaRegistryConfig;
use crate::error::SchemaRegistryError;
use crate::schema::{
    ErrorBody, RegisterRequest, RegisterResponse, RegisteredSchema, SchemaByIdResponse,
    SchemaType, SubjectVersionResponse,
};

/// Registry REST API のメディアタイプ。
const REGISTRY_MEDIA_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Schema Registry クライアントのインターフェース。
///
/// サブジェクトの最新スキーマ取得と、未登録時のスキーマ登録を提供する。
/// 実装は複数リクエストから同時に利用されるため `Send + Sync` を要求する。
/// `mock` feature を有効にすると `MockSchemaRegistryClient` が生成される。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SchemaRegistryClient: Send + Sync {
    /// スキーマをサブジェクトに登録し、スキーマ ID を返す。
    ///
    /// 同一スキーマが既に存在する場合、Registry は既存の ID を返す。
    async fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i32, SchemaRegistryError>;

    /// グローバルスキーマ ID でスキーマを取得する。
    async fn get_schema_by_id(&self, schema_id: i32)
        -> Result<RegisteredSchema, SchemaRegistryError>;

    /// サブジェクトの最新バージョンのスキーマを取得する。
    ///
    /// サブジェクトが存在しない場合は `SchemaNotFound` を返す。
    async fn get_latest_schema(&self, subject: &str)
        -> Result<RegisteredSchema, SchemaRegistryError>;

    /// Schema Registry サービスへの接続を確認する。
    async fn health_check(&self) -> Result<(), SchemaRegistryError>;
}

/// reqwest で Confluent 互換 Schema Registry の REST API を呼び出す実装。
pub struct HttpSchemaRegistryClient {
    config: SchemaRegistryConfig,
    http: reqwest::Client,
}

impl HttpSchemaRegistryClient {
    /// `config.timeout_secs` をリクエストタイムアウトとしてクライアントを構築する。
    pub fn new(config: SchemaRegistryConfig) -> Result<Self, SchemaRegistryError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SchemaRegistryError::Unavailable(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    /// リクエストを送信し、成功レスポンスを `T` にデコードする。
    ///
    /// 404 および Registry の not-found エラーコードは `SchemaNotFound`、
    /// それ以外の非 2xx は `Unavailable` に変換する。
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        subject: &str,
    ) -> Result<T, SchemaRegistryError> {
        let response = request.header(ACCEPT, REGISTRY_MEDIA_TYPE).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        if status == StatusCode::NOT_FOUND || body.is_not_found() {
            return Err(SchemaRegistryError::SchemaNotFound {
                subject: subject.to_string(),
                version: None,
            });
        }

        warn!(
            %status,
            error_code = body.error_code,
            subject,
            "schema registry request failed"
        );
        let detail = if body.message.is_empty() {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            body.message
        };
        Err(SchemaRegistryError::Unavailable(format!(
            "HTTP {status}: {detail}"
        )))
    }
}

#[async_trait]
impl SchemaRegistryClient for HttpSchemaRegistryClient {
    async fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i32, SchemaRegistryError> {
        let payload = serde_json::to_vec(&RegisterRequest {
            schema,
            schema_type,
        })?;
        let request = self
            .http
            .post(self.url(&format!("/subjects/{subject}/versions")))
            .header(CONTENT_TYPE, REGISTRY_MEDIA_TYPE)
            .body(payload);

        let registered: RegisterResponse = self.execute(request, subject).await?;
        debug!(subject, id = registered.id, %schema_type, "register request accepted");
        Ok(registered.id)
    }

    async fn get_schema_by_id(
        &self,
        schema_id: i32,
    ) -> Result<RegisteredSchema, SchemaRegistryError> {
        let request = self.http.get(self.url(&format!("/schemas/ids/{schema_id}")));
        let found: SchemaByIdResponse = self
            .execute(request, &format!("schema id {schema_id}"))
            .await?;

        Ok(RegisteredSchema {
            id: schema_id,
            subject: String::new(),
            version: 0,
            schema: found.schema,
            schema_type: found.schema_type,
        })
    }

    async fn get_latest_schema(
        &self,
        subject: &str,
    ) -> Result<RegisteredSchema, SchemaRegistryError> {
        let request = self
            .http
            .get(self.url(&format!("/subjects/{subject}/versions/latest")));
        let latest: SubjectVersionResponse = self.execute(request, subject).await?;
        debug!(subject, id = latest.id, version = latest.version, "fetched latest schema");
        Ok(latest.into())
    }

    async fn health_check(&self) -> Result<(), SchemaRegistryError> {
        let response = self
            .http
            .get(self.url("/"))
            .send()
            .await
            .map_err(|e| SchemaRegistryError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SchemaRegistryError::Unavailable(format!(
                "health check returned HTTP {status}"
            )))
        }
    }
}
