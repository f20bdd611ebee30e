use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrokerError;

/// BrokerClient はイベントを永続ログへ送るメッセージブローカーのインターフェース。
///
/// 1 つのインスタンスを全リクエストで共有するため `Send + Sync` を要求する。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// ブローカーへの到達性を確認し、セッションを確立する。
    async fn connect(&self) -> Result<(), BrokerError>;

    /// フレーム化済みのキー/値を `topic` へ送信する。
    async fn send(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<(), BrokerError>;

    /// 送信待ちのメッセージをすべて書き出す。
    async fn flush(&self) -> Result<(), BrokerError>;
}

/// ブローカーに送信されたメッセージ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// InMemoryBrokerClient は送信メッセージをメモリに保持するブローカー実装。
///
/// 接続・送信の失敗や送信遅延を注入できる。
#[derive(Default)]
pub struct InMemoryBrokerClient {
    messages: Mutex<Vec<SentMessage>>,
    fail_connect: AtomicBool,
    fail_send: AtomicBool,
    send_delay_ms: AtomicU64,
    connect_calls: AtomicUsize,
    send_calls: AtomicUsize,
    flush_calls: AtomicUsize,
}

impl InMemoryBrokerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// 各 send の完了を指定時間だけ遅らせる。
    pub fn set_send_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.send_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// 送信に成功したメッセージのスナップショット。
    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// send の呼び出し回数（失敗・タイムアウトを含む）。
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn flush_calls(&self) -> usize {
        self.flush_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerClient for InMemoryBrokerClient {
    async fn connect(&self) -> Result<(), BrokerError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(BrokerError::Connection("broker unreachable".to_string()));
        }
        Ok(())
    }

    async fn send(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<(), BrokerError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.send_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(BrokerError::Send("injected send failure".to_string()));
        }
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                topic: topic.to_string(),
                key: key.to_vec(),
                value: value.to_vec(),
            });
        Ok(())
    }

    async fn flush(&self) -> Result<(), BrokerError> {
        self.flush_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
