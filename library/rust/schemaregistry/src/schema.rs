use serde::{Deserialize, Serialize};

/// Schema Registry に登録されたスキーマ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredSchema {
    /// グローバルスキーマ ID。フレームのヘッダーに埋め込まれる。
    pub id: i32,
    /// サブジェクト名（例: `user_events_by_day-value`）。ID 指定で取得した場合は空。
    pub subject: String,
    /// サブジェクト内のバージョン。ID 指定で取得した場合は 0。
    pub version: i32,
    /// スキーマ定義（Avro の場合は JSON 文字列）。
    pub schema: String,
    pub schema_type: SchemaType,
}

/// スキーマのフォーマット種別。
///
/// Registry は Avro の場合 `schemaType` を省略するため、既定値は Avro。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    #[default]
    Avro,
    Json,
    Protobuf,
}

impl SchemaType {
    /// Registry API 上の表記を返す。
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// POST /subjects/{subject}/versions のボディ。
#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub schema: &'a str,
    #[serde(rename = "schemaType")]
    pub schema_type: SchemaType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterResponse {
    pub id: i32,
}

/// GET /schemas/ids/{id} のレスポンス。
#[derive(Debug, Deserialize)]
pub(crate) struct SchemaByIdResponse {
    pub schema: String,
    #[serde(rename = "schemaType", default)]
    pub schema_type: SchemaType,
}

/// GET /subjects/{subject}/versions/{version} のレスポンス。
#[derive(Debug, Deserialize)]
pub(crate) struct SubjectVersionResponse {
    pub subject: String,
    pub version: i32,
    pub id: i32,
    pub schema: String,
    #[serde(rename = "schemaType", default)]
    pub schema_type: SchemaType,
}

impl From<SubjectVersionResponse> for RegisteredSchema {
    fn from(resp: SubjectVersionResponse) -> Self {
        Self {
            id: resp.id,
            subject: resp.subject,
            version: resp.version,
            schema: resp.schema,
            schema_type: resp.schema_type,
        }
    }
}

/// Registry のエラーレスポンス（`{"error_code": 40401, "message": "..."}`）。
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: i32,
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    /// 40401: subject not found / 40402: version not found / 40403: schema not found
    pub fn is_not_found(&self) -> bool {
        matches!(self.error_code, 40401..=40403)
    }
}
