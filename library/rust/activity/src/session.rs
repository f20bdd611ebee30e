use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{error, info};

use crate::broker::BrokerClient;
use crate::error::ActivityError;
use crate::resolver::SchemaResolver;
use crate::schema::SchemaBindings;

/// SessionState はブローカーセッションのライフサイクル。
///
/// `Unstarted → Starting → {Ready | Degraded}`。Ready と Degraded は終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Unstarted,
    Starting,
    Ready,
    Degraded,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            STARTING => SessionState::Starting,
            READY => SessionState::Ready,
            DEGRADED => SessionState::Degraded,
            _ => SessionState::Unstarted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unstarted => "UNSTARTED",
            SessionState::Starting => "STARTING",
            SessionState::Ready => "READY",
            SessionState::Degraded => "DEGRADED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const UNSTARTED: u8 = 0;
const STARTING: u8 = 1;
const READY: u8 = 2;
const DEGRADED: u8 = 3;

/// SessionManager はブローカー接続とスキーマ解決を一度だけ行い、準備完了フラグを公開する。
///
/// 起動時に一度構築し、`Arc` で emit を呼ぶ全経路に共有する。
pub struct SessionManager {
    broker: Arc<dyn BrokerClient>,
    resolver: SchemaResolver,
    stream: String,
    state: AtomicU8,
    bindings: OnceLock<SchemaBindings>,
}

impl SessionManager {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        resolver: SchemaResolver,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            resolver,
            stream: stream.into(),
            state: AtomicU8::new(UNSTARTED),
            bindings: OnceLock::new(),
        }
    }

    /// ブローカーへ接続し、スキーマを解決する。
    ///
    /// 最初の呼び出しのみが処理を行い、2 回目以降は現在の状態を返すだけで I/O を行わない。
    /// 失敗はすべて Degraded 状態として吸収され、呼び出し元へは返らない。
    pub async fn start(&self) -> SessionState {
        if self
            .state
            .compare_exchange(UNSTARTED, STARTING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.state();
        }
        info!(stream = %self.stream, "activity session starting");

        match self.connect_and_resolve().await {
            Ok(bindings) => {
                let key_schema_id = bindings.key_schema_id();
                let value_schema_id = bindings.value_schema_id();
                // bindings の書き込みは Ready の公開より前に行う
                let _ = self.bindings.set(bindings);
                self.state.store(READY, Ordering::Release);
                info!(
                    stream = %self.stream,
                    key_schema_id,
                    value_schema_id,
                    "activity session ready"
                );
            }
            Err(e) => {
                self.state.store(DEGRADED, Ordering::Release);
                error!(
                    stream = %self.stream,
                    error = %e,
                    "activity session degraded; events will be skipped until restart"
                );
            }
        }
        self.state()
    }

    async fn connect_and_resolve(&self) -> Result<SchemaBindings, ActivityError> {
        self.broker.connect().await?;
        self.resolver.resolve(&self.stream).await
    }

    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 解決済みスキーマ。Ready になるまでは None。
    pub fn bindings(&self) -> Option<&SchemaBindings> {
        if self.is_ready() {
            self.bindings.get()
        } else {
            None
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn broker(&self) -> &Arc<dyn BrokerClient> {
        &self.broker
    }
}
