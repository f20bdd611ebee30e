use std::time::Duration;

use handcraft_schemaregistry::SchemaRegistryError;

/// ActivityError はアクティビティイベント発行パイプラインのエラーを表す。
///
/// いずれも `emit` の呼び出し元へは伝播せず、ログ出力後に破棄される。
#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    /// Schema Registry 呼び出しが失敗した（SchemaNotFound を含む）。
    #[error("schema registry error: {0}")]
    Registry(#[from] SchemaRegistryError),

    /// 起動時のスキーマ解決がリトライ上限に達した。
    #[error("schema resolution exhausted after {attempts} attempts: {last_error}")]
    ResolveExhausted { attempts: u32, last_error: String },

    /// イベントのエンコードに失敗した。
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// ブローカーへの接続・送信に失敗した。
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// 送信待ちキューが満杯のため新しいイベントを破棄した。
    #[error("emit queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// パブリッシャーが停止済みのためイベントを受け付けない。
    #[error("publisher is closed")]
    Closed,
}

/// EncodingError はイベントとバインド済みスキーマの不整合を表す。
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// スキーマ ID が未解決（セッション未準備）。
    #[error("schema ids are not bound yet")]
    SchemaUnbound,

    /// フィールド値がスキーマの制約を満たさない。
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Avro シリアライズに失敗した。
    #[error("avro encoding failed: {0}")]
    Avro(String),
}

/// BrokerError はメッセージブローカー操作のエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connection(String),

    #[error("broker send failed: {0}")]
    Send(String),

    #[error("broker send timed out after {0:?}")]
    Timeout(Duration),
}
