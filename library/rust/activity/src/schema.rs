use apache_avro::Schema;
use handcraft_schemaregistry::SchemaRegistryError;

/// 値サブジェクト未登録時に登録する Avro スキーマ定義。
pub const VALUE_SCHEMA: &str = include_str!("../schemas/user_events_by_day-value.avsc");

/// キーサブジェクト未登録時に登録する Avro スキーマ定義。
pub const KEY_SCHEMA: &str = r#"{
  "type": "record",
  "name": "UserEventKey",
  "namespace": "handcraft.activity",
  "fields": [
    {"name": "day", "type": "string"},
    {"name": "event_time", "type": "long"},
    {"name": "event_id", "type": "string"}
  ]
}"#;

/// SchemaBinding は Registry が発行したスキーマ ID と、その ID に対応する書き込みスキーマの組。
#[derive(Debug, Clone)]
pub struct SchemaBinding {
    pub id: i32,
    pub schema: Schema,
}

impl SchemaBinding {
    /// スキーマ定義文字列をパースしてバインディングを作る。
    pub fn parse(id: i32, definition: &str) -> Result<Self, SchemaRegistryError> {
        let schema = Schema::parse_str(definition)
            .map_err(|e| SchemaRegistryError::InvalidSchema(e.to_string()))?;
        Ok(Self { id, schema })
    }
}

/// SchemaBindings はキー・値両方の解決済みスキーマ。
///
/// 一度設定されるとプロセス終了まで変化しない。
#[derive(Debug, Clone)]
pub struct SchemaBindings {
    pub key: SchemaBinding,
    pub value: SchemaBinding,
}

impl SchemaBindings {
    pub fn key_schema_id(&self) -> i32 {
        self.key.id
    }

    pub fn value_schema_id(&self) -> i32 {
        self.value.id
    }
}
