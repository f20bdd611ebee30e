//! handcraft-telemetry: 構造化ログの初期化ライブラリ。

pub mod logger;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// TelemetryConfig は telemetry ライブラリの初期化設定を保持する。
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub version: String,
    pub environment: String,
    /// EnvFilter 形式のディレクティブ（例: "info", "handcraft_activity=debug,info"）。
    pub log_level: String,
    /// "text" ならプレーンテキスト、それ以外は JSON。
    pub log_format: String,
}

impl TelemetryConfig {
    fn filter(&self) -> EnvFilter {
        // RUST_LOG が設定されていればそちらを優先する
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    fn is_text(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("text")
    }
}

/// グローバル subscriber を設定する。プロセス内で 2 回目の呼び出しはエラーになる。
pub fn init_telemetry(cfg: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry().with(cfg.filter());
    if cfg.is_text() {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    } else {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()?;
    }

    tracing::info!(
        service = %cfg.service_name,
        version = %cfg.version,
        environment = %cfg.environment,
        "telemetry initialized"
    );
    Ok(())
}
