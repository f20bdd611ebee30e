use std::time::Duration;

use rand::Rng;

/// RetryConfig は試行回数と試行間の待機時間を表す。
///
/// 待機時間は `initial_delay * multiplier^attempt` を `max_delay` で頭打ちにしたもの。
/// `jitter` が有効な場合は ±10% の揺らぎを加える。
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(100), Duration::from_secs(30))
    }
}

impl RetryConfig {
    /// 固定間隔でリトライする設定（バックオフ・ジッターなし）。
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            jitter: false,
        }
    }

    /// 待機時間を 2 倍ずつ伸ばす設定（ジッターあり）。
    pub fn exponential(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier: 2.0,
            jitter: true,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// `attempt` 回目（0 始まり）の失敗後に待機する時間。
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let base = if (factor - 1.0).abs() < f64::EPSILON {
            self.initial_delay
        } else {
            scale(self.initial_delay, factor).unwrap_or(self.max_delay)
        };
        let capped = base.min(self.max_delay);

        if self.jitter {
            let spread = rand::thread_rng().gen_range(0.9..=1.1);
            scale(capped, spread).unwrap_or(capped)
        } else {
            capped
        }
    }
}

fn scale(delay: Duration, factor: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).ok()
}
