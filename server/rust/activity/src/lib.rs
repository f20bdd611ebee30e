//! handcraft-activity-server: アクティビティイベント発行パイプラインのホストサーバー。
//!
//! HTTP リスナーと並行してブローカーセッションを起動し、準備状態の確認と
//! デバッグ用のイベント発行エンドポイントを提供する。

pub mod adapter;
pub mod infrastructure;
