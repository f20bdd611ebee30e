#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use handcraft_activity::schema::{KEY_SCHEMA, VALUE_SCHEMA};
use handcraft_activity::{
    ActivityConfig, EventPublisher, InMemoryBrokerClient, SchemaResolver, SessionManager,
    SessionState,
};
use handcraft_schemaregistry::{
    RegisteredSchema, SchemaRegistryClient, SchemaRegistryError, SchemaType,
};
use tracing_subscriber::fmt::MakeWriter;

pub const STREAM: &str = "user_events_by_day";

/// 呼び出し回数を数えるインメモリの Schema Registry。
///
/// 値サブジェクトの取得（= 解決 1 回分）の最初の `failures` 回を一時障害として失敗させる。
pub struct FakeRegistry {
    failures: u32,
    value_subject_missing: bool,
    register_id: i32,
    registered: AtomicBool,
    attempts: AtomicU32,
    latest_calls: AtomicU32,
    register_calls: AtomicU32,
}

impl FakeRegistry {
    pub fn healthy() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            value_subject_missing: false,
            register_id: 0,
            registered: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
            latest_calls: AtomicU32::new(0),
            register_calls: AtomicU32::new(0),
        }
    }

    /// 値サブジェクトが未登録で、登録すると `id` が払い出される Registry。
    pub fn value_subject_missing(id: i32) -> Self {
        Self {
            value_subject_missing: true,
            register_id: id,
            ..Self::healthy()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn latest_calls(&self) -> u32 {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> u32 {
        self.register_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaRegistryClient for FakeRegistry {
    async fn register_schema(
        &self,
        _subject: &str,
        _schema: &str,
        _schema_type: SchemaType,
    ) -> Result<i32, SchemaRegistryError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registered.store(true, Ordering::SeqCst);
        Ok(self.register_id)
    }

    async fn get_schema_by_id(
        &self,
        schema_id: i32,
    ) -> Result<RegisteredSchema, SchemaRegistryError> {
        Err(SchemaRegistryError::SchemaNotFound {
            subject: format!("id:{schema_id}"),
            version: None,
        })
    }

    async fn get_latest_schema(
        &self,
        subject: &str,
    ) -> Result<RegisteredSchema, SchemaRegistryError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        let is_value = subject.ends_with("-value");

        if is_value {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                return Err(SchemaRegistryError::Unavailable(
                    "HTTP 503: service unavailable".to_string(),
                ));
            }
            if self.value_subject_missing && !self.registered.load(Ordering::SeqCst) {
                return Err(SchemaRegistryError::SchemaNotFound {
                    subject: subject.to_string(),
                    version: None,
                });
            }
        }

        let (id, schema) = if is_value {
            (if self.value_subject_missing { self.register_id } else { 1 }, VALUE_SCHEMA)
        } else {
            (2, KEY_SCHEMA)
        };
        Ok(RegisteredSchema {
            id,
            subject: subject.to_string(),
            version: 1,
            schema: schema.to_string(),
            schema_type: SchemaType::Avro,
        })
    }

    async fn health_check(&self) -> Result<(), SchemaRegistryError> {
        Ok(())
    }
}

pub fn session_with(
    broker: Arc<InMemoryBrokerClient>,
    registry: Arc<FakeRegistry>,
    config: &ActivityConfig,
) -> Arc<SessionManager> {
    let resolver = SchemaResolver::new(registry, config.retry_config());
    Arc::new(SessionManager::new(broker, resolver, STREAM))
}

/// Ready 状態のセッションに接続したパブリッシャーを返す。
pub async fn ready_publisher(
    broker: Arc<InMemoryBrokerClient>,
    config: &ActivityConfig,
) -> EventPublisher {
    let session = session_with(broker, Arc::new(FakeRegistry::healthy()), config);
    assert_eq!(session.start().await, SessionState::Ready);
    EventPublisher::new(session, config)
}

/// ログ出力を蓄積するライター。
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_containing(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// `f` の実行中に出力されたログを捕捉する。
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, LogBuffer) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer)
}
