use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::broker::BrokerClient;
use crate::codec::{EncodedMessage, EventEncoder};
use crate::config::ActivityConfig;
use crate::error::{ActivityError, BrokerError};
use crate::event::{ActivityEvent, ActivityType};
use crate::session::{SessionManager, SessionState};

/// ActivityEmitter はアプリケーションからイベントを発行するためのインターフェース。
///
/// `emit` は呼び出し元をブロックせず、失敗を返さない。失敗はすべてログに記録して破棄する。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ActivityEmitter: Send + Sync {
    /// イベントをベストエフォートで発行する。
    fn emit(&self, event: &ActivityEvent);

    fn is_ready(&self) -> bool;

    fn state(&self) -> SessionState;

    fn stats(&self) -> StatsSnapshot;

    /// 受付を停止し、キュー内と送信中のイベントを書き出してから返る。
    async fn close(&self);
}

/// パブリッシャーの累積カウンター。
#[derive(Debug, Default)]
pub struct PublisherStats {
    emitted: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    sent: AtomicU64,
}

impl PublisherStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            emitted: self.emitted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
        }
    }
}

/// StatsSnapshot はある時点のカウンター値。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// 送信キューに受け付けたイベント数
    pub emitted: u64,
    /// 準備未完了のため送信しなかったイベント数
    pub skipped: u64,
    /// キュー満杯・停止済みのため破棄したイベント数
    pub dropped: u64,
    /// エンコードまたは送信に失敗したイベント数
    pub failed: u64,
    /// ブローカーが受理したイベント数
    pub sent: u64,
}

struct Outgoing {
    event_id: String,
    activity_type: ActivityType,
    message: EncodedMessage,
}

/// EventPublisher はセッションが Ready のときだけイベントをエンコードし、送信キューへ積む。
///
/// 送信はバックグラウンドのディスパッチャーが `max_in_flight` 件まで並行して行い、
/// 各送信に `send_timeout` を適用する。生成は Tokio ランタイム内で行うこと。
pub struct EventPublisher {
    session: Arc<SessionManager>,
    encoder: EventEncoder,
    tx: mpsc::Sender<Outgoing>,
    capacity: usize,
    stats: Arc<PublisherStats>,
    closed: AtomicBool,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl EventPublisher {
    pub fn new(session: Arc<SessionManager>, config: &ActivityConfig) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let stats = Arc::new(PublisherStats::default());

        let dispatcher = Dispatcher {
            broker: session.broker().clone(),
            topic: Arc::from(session.stream()),
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            send_timeout: config.send_timeout(),
            stats: stats.clone(),
        };
        let handle = tokio::spawn(dispatcher.run(rx, shutdown_rx));

        Self {
            session,
            encoder: EventEncoder::new(config.max_metadata_bytes),
            tx,
            capacity,
            stats,
            closed: AtomicBool::new(false),
            shutdown: Mutex::new(Some(shutdown_tx)),
            dispatcher: Mutex::new(Some(handle)),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    fn drop_event(&self, event: &ActivityEvent, reason: ActivityError) {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            event_id = %event.event_id,
            activity_type = %event.activity_type,
            error = %reason,
            "activity event dropped"
        );
    }
}

#[async_trait]
impl ActivityEmitter for EventPublisher {
    fn emit(&self, event: &ActivityEvent) {
        if self.closed.load(Ordering::Acquire) {
            self.drop_event(event, ActivityError::Closed);
            return;
        }

        let Some(bindings) = self.session.bindings() else {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            warn!(
                event_id = %event.event_id,
                activity_type = %event.activity_type,
                state = %self.session.state(),
                "emit skipped (not ready)"
            );
            return;
        };

        let message = match self.encoder.encode(Some(bindings), event) {
            Ok(message) => message,
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    event_id = %event.event_id,
                    activity_type = %event.activity_type,
                    error = %e,
                    "activity event encoding failed"
                );
                return;
            }
        };

        let outgoing = Outgoing {
            event_id: event.event_id.clone(),
            activity_type: event.activity_type,
            message,
        };
        match self.tx.try_send(outgoing) {
            Ok(()) => {
                self.stats.emitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) => self.drop_event(
                event,
                ActivityError::QueueFull {
                    capacity: self.capacity,
                },
            ),
            Err(TrySendError::Closed(_)) => self.drop_event(event, ActivityError::Closed),
        }
    }

    fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    fn state(&self) -> SessionState {
        self.session.state()
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }

        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "activity dispatcher terminated abnormally");
            }
        }

        let stats = self.stats.snapshot();
        info!(
            emitted = stats.emitted,
            sent = stats.sent,
            failed = stats.failed,
            dropped = stats.dropped,
            skipped = stats.skipped,
            "activity publisher closed"
        );
    }
}

struct Dispatcher {
    broker: Arc<dyn BrokerClient>,
    topic: Arc<str>,
    permits: Arc<Semaphore>,
    send_timeout: Duration,
    stats: Arc<PublisherStats>,
}

impl Dispatcher {
    async fn run(self, mut rx: mpsc::Receiver<Outgoing>, mut shutdown: oneshot::Receiver<()>) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(outgoing) => self.dispatch(&mut in_flight, outgoing).await,
                    None => break,
                },
                // パブリッシャーの drop でも停止する
                _ = &mut shutdown => {
                    rx.close();
                    while let Some(outgoing) = rx.recv().await {
                        self.dispatch(&mut in_flight, outgoing).await;
                    }
                    break;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join_error(joined);
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            log_join_error(joined);
        }
        if let Err(e) = self.broker.flush().await {
            error!(error = %e, "failed to flush broker on close");
        }
    }

    async fn dispatch(&self, in_flight: &mut JoinSet<()>, outgoing: Outgoing) {
        let Ok(permit) = self.permits.clone().acquire_owned().await else {
            return;
        };
        let broker = self.broker.clone();
        let topic = self.topic.clone();
        let send_timeout = self.send_timeout;
        let stats = self.stats.clone();

        in_flight.spawn(async move {
            let _permit = permit;
            let Outgoing {
                event_id,
                activity_type,
                message,
            } = outgoing;

            let result = match tokio::time::timeout(
                send_timeout,
                broker.send(&topic, &message.key, &message.value),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(BrokerError::Timeout(send_timeout)),
            };

            match result {
                Ok(()) => {
                    stats.sent.fetch_add(1, Ordering::Relaxed);
                    debug!(%event_id, %activity_type, topic = %topic, "activity event sent");
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!(%event_id, %activity_type, error = %e, "activity event send failed");
                }
            }
        });
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "activity send task panicked");
    }
}

/// NoopActivityEmitter はイベントを発行しない実装（ブローカー未設定時のフォールバック用）。
#[derive(Debug, Default)]
pub struct NoopActivityEmitter {
    skipped: AtomicU64,
}

impl NoopActivityEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityEmitter for NoopActivityEmitter {
    fn emit(&self, event: &ActivityEvent) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        debug!(event_id = %event.event_id, "noop: activity event skipped");
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn state(&self) -> SessionState {
        SessionState::Unstarted
    }

    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            skipped: self.skipped.load(Ordering::Relaxed),
            ..StatsSnapshot::default()
        }
    }

    async fn close(&self) {}
}
