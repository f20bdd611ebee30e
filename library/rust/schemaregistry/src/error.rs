/// SchemaRegistryError は Schema Registry 操作に関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum SchemaRegistryError {
    /// HTTP リクエストが失敗した。
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 指定したサブジェクトまたはスキーマが見つからない。
    #[error("Schema not found: subject={subject}, version={version:?}")]
    SchemaNotFound {
        /// スキーマのサブジェクト名。
        subject: String,
        /// スキーマのバージョン（None の場合は latest を指す）。
        version: Option<i32>,
    },

    /// スキーマの形式が不正。
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// JSON シリアライズ／デシリアライズに失敗した。
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema Registry サービスが利用不可。
    #[error("Schema Registry unavailable: {0}")]
    Unavailable(String),
}

impl SchemaRegistryError {
    /// サブジェクト/スキーマ未登録を示すエラーかどうかを返す。
    ///
    /// このエラーのみが登録フォールバックの契機となり、それ以外は一時障害として扱う。
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaRegistryError::SchemaNotFound { .. })
    }
}
