//! アクティビティイベントのキー/値エンコーダー。
//!
//! キーと値はどちらも Schema Registry 形式でフレーム化される:
//! `[0x00][スキーマ ID: 4 バイト big-endian][Avro バイナリ]`。
//! コンシューマーはバイト列だけから書き込みスキーマを特定できる。

use apache_avro::types::Value;

use crate::error::EncodingError;
use crate::event::{day_for, ActivityEvent};
use crate::schema::{SchemaBinding, SchemaBindings};

/// フレーム先頭のマジックバイト。
pub const MAGIC_BYTE: u8 = 0x00;

const FRAME_HEADER_LEN: usize = 5;

/// EncodedMessage はブローカーへ送る 1 メッセージ分のキーと値。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// ペイロードにマジックバイトとスキーマ ID を付与する。
pub fn frame(schema_id: i32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.push(MAGIC_BYTE);
    buf.extend_from_slice(&schema_id.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// フレームからスキーマ ID とペイロードを取り出す。形式が不正な場合は None。
pub fn unframe(bytes: &[u8]) -> Option<(i32, &[u8])> {
    if bytes.len() < FRAME_HEADER_LEN || bytes[0] != MAGIC_BYTE {
        return None;
    }
    let id = i32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    Some((id, &bytes[FRAME_HEADER_LEN..]))
}

/// EventEncoder はイベントを検証し、バインド済みスキーマでキー/値をエンコードする。
///
/// 同じイベントとバインディングからは常に同じバイト列を生成する。
#[derive(Debug, Clone)]
pub struct EventEncoder {
    max_metadata_bytes: usize,
}

impl EventEncoder {
    pub fn new(max_metadata_bytes: usize) -> Self {
        Self { max_metadata_bytes }
    }

    /// イベントをエンコードする。
    ///
    /// スキーマ未解決の場合は `SchemaUnbound` を返す。呼び出し側は事前に準備状態を確認すること。
    pub fn encode(
        &self,
        bindings: Option<&SchemaBindings>,
        event: &ActivityEvent,
    ) -> Result<EncodedMessage, EncodingError> {
        let bindings = bindings.ok_or(EncodingError::SchemaUnbound)?;
        self.validate(event)?;

        let key = encode_record(&bindings.key, key_record(event))?;
        let value = encode_record(&bindings.value, value_record(event))?;
        Ok(EncodedMessage { key, value })
    }

    fn validate(&self, event: &ActivityEvent) -> Result<(), EncodingError> {
        if event.event_id.is_empty() {
            return Err(EncodingError::InvalidField {
                field: "event_id",
                reason: "must not be empty".to_string(),
            });
        }

        let Some(expected_day) = day_for(event.event_time) else {
            return Err(EncodingError::InvalidField {
                field: "event_time",
                reason: format!("{} is out of the representable range", event.event_time),
            });
        };
        if event.day != expected_day {
            return Err(EncodingError::InvalidField {
                field: "day",
                reason: format!(
                    "{:?} is not the UTC date of event_time (expected {})",
                    event.day, expected_day
                ),
            });
        }

        if event.metadata_json.len() > self.max_metadata_bytes {
            return Err(EncodingError::InvalidField {
                field: "metadata_json",
                reason: format!(
                    "{} bytes exceeds limit of {} bytes",
                    event.metadata_json.len(),
                    self.max_metadata_bytes
                ),
            });
        }
        Ok(())
    }
}

fn key_record(event: &ActivityEvent) -> Value {
    let key = event.key();
    Value::Record(vec![
        ("day".to_string(), Value::String(key.day.to_string())),
        ("event_time".to_string(), Value::Long(key.event_time)),
        ("event_id".to_string(), Value::String(key.event_id.to_string())),
    ])
}

fn value_record(event: &ActivityEvent) -> Value {
    Value::Record(vec![
        ("event_id".to_string(), Value::String(event.event_id.clone())),
        ("user_id".to_string(), Value::String(event.user_id.clone())),
        (
            "activity_type".to_string(),
            Value::String(event.activity_type.as_str().to_string()),
        ),
        ("event_time".to_string(), Value::Long(event.event_time)),
        ("day".to_string(), Value::String(event.day.clone())),
        ("entity_id".to_string(), Value::String(event.entity_id.clone())),
        (
            "metadata_json".to_string(),
            Value::String(event.metadata_json.clone()),
        ),
    ])
}

fn encode_record(binding: &SchemaBinding, record: Value) -> Result<Vec<u8>, EncodingError> {
    let payload = apache_avro::to_avro_datum(&binding.schema, record)
        .map_err(|e| EncodingError::Avro(e.to_string()))?;
    Ok(frame(binding.id, &payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ActivityType;
    use crate::schema::{KEY_SCHEMA, VALUE_SCHEMA};
    use chrono::{TimeZone, Utc};

    fn bindings() -> SchemaBindings {
        SchemaBindings {
            key: SchemaBinding::parse(3, KEY_SCHEMA).unwrap(),
            value: SchemaBinding::parse(7, VALUE_SCHEMA).unwrap(),
        }
    }

    fn event() -> ActivityEvent {
        ActivityEvent {
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            activity_type: ActivityType::CreateProject,
            event_time: 1_700_000_000_000,
            day: "2023-11-14".to_string(),
            entity_id: String::new(),
            metadata_json: "{}".to_string(),
        }
    }

    fn decode(binding: &SchemaBinding, bytes: &[u8]) -> Vec<(String, Value)> {
        let (id, mut payload) = unframe(bytes).unwrap();
        assert_eq!(id, binding.id);
        match apache_avro::from_avro_datum(&binding.schema, &mut payload, None).unwrap() {
            Value::Record(fields) => fields,
            other => panic!("record expected: {other:?}"),
        }
    }

    #[test]
    fn test_frame_layout() {
        let framed = frame(7, &[0xAA, 0xBB]);
        assert_eq!(framed, vec![0x00, 0, 0, 0, 7, 0xAA, 0xBB]);
        assert_eq!(unframe(&framed), Some((7, &[0xAA, 0xBB][..])));
    }

    #[test]
    fn test_unframe_rejects_malformed() {
        assert_eq!(unframe(&[0x00, 0, 0]), None);
        assert_eq!(unframe(&[0x01, 0, 0, 0, 7]), None);
    }

    #[test]
    fn test_encode_key_fields() {
        let b = bindings();
        let msg = EventEncoder::new(1024).encode(Some(&b), &event()).unwrap();
        let fields = decode(&b.key, &msg.key);
        assert_eq!(
            fields,
            vec![
                ("day".to_string(), Value::String("2023-11-14".to_string())),
                ("event_time".to_string(), Value::Long(1_700_000_000_000)),
                ("event_id".to_string(), Value::String("e1".to_string())),
            ]
        );
    }

    #[test]
    fn test_encode_value_fields() {
        let b = bindings();
        let msg = EventEncoder::new(1024).encode(Some(&b), &event()).unwrap();
        let fields = decode(&b.value, &msg.value);
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[2].1, Value::String("CREATE_PROJECT".to_string()));
        assert_eq!(fields[3].1, Value::Long(1_700_000_000_000));
        assert_eq!(fields[6].1, Value::String("{}".to_string()));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let b = bindings();
        let encoder = EventEncoder::new(1024);
        let first = encoder.encode(Some(&b), &event()).unwrap();
        let second = encoder.encode(Some(&b), &event()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_without_bindings() {
        let err = EventEncoder::new(1024).encode(None, &event()).unwrap_err();
        assert!(matches!(err, EncodingError::SchemaUnbound));
    }

    #[test]
    fn test_day_must_match_event_time() {
        let mut e = event();
        e.day = "2023-11-15".to_string();
        let err = EventEncoder::new(1024)
            .encode(Some(&bindings()), &e)
            .unwrap_err();
        assert!(matches!(err, EncodingError::InvalidField { field: "day", .. }));

        e.day = "not-a-date".to_string();
        assert!(EventEncoder::new(1024).encode(Some(&bindings()), &e).is_err());
    }

    #[test]
    fn test_event_time_out_of_range() {
        let mut e = event();
        e.event_time = i64::MIN;
        let err = EventEncoder::new(1024)
            .encode(Some(&bindings()), &e)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidField {
                field: "event_time",
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_metadata() {
        let mut e = event();
        e.metadata_json = format!("\"{}\"", "x".repeat(2048));
        let err = EventEncoder::new(1024)
            .encode(Some(&bindings()), &e)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidField {
                field: "metadata_json",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_event_id() {
        let mut e = event();
        e.event_id = String::new();
        let err = EventEncoder::new(1024)
            .encode(Some(&bindings()), &e)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidField {
                field: "event_id",
                ..
            }
        ));
    }

    #[test]
    fn test_mismatched_registry_schema_is_encoding_error() {
        // Registry 側の最新スキーマに未知の必須フィールドがある場合
        let foreign = r#"{"type":"record","name":"Other","fields":[
            {"name":"event_id","type":"string"},
            {"name":"tenant","type":"string"}]}"#;
        let b = SchemaBindings {
            key: SchemaBinding::parse(3, KEY_SCHEMA).unwrap(),
            value: SchemaBinding::parse(9, foreign).unwrap(),
        };
        let err = EventEncoder::new(1024).encode(Some(&b), &event()).unwrap_err();
        assert!(matches!(err, EncodingError::Avro(_)));
    }

    #[test]
    fn test_builder_event_encodes() {
        let t = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let e = ActivityEvent::at("u9", ActivityType::UploadImage, t)
            .with_metadata(&serde_json::json!({"images": 2}));
        assert!(EventEncoder::new(1024).encode(Some(&bindings()), &e).is_ok());
    }
}
