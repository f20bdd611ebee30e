//! 構造化ログの規約。
//! フィールドは構造化し、メッセージは英語の固定文字列とする。
//!
//! # 使用例
//!
//! ```ignore
//! use tracing::{info, warn, error};
//!
//! info!(topic = "user_events_by_day", "activity producer ready");
//! warn!(event_id = %id, "emit skipped (not ready)");
//! error!(error = %e, "schema resolution failed");
//! ```

/// 環境名に対応するデフォルトのログレベルを返す。
///
/// - dev: debug
/// - staging: info
/// - それ以外: warn
pub fn level_for_environment(env: &str) -> &'static str {
    match env {
        "dev" => "debug",
        "staging" => "info",
        _ => "warn",
    }
}
