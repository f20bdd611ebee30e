use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ActivityType はアクティビティ種別の閉じた列挙。
///
/// シリアライズ時は `CREATE_PROJECT` 形式のタグになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    CreateProject,
    ViewProject,
    UploadImage,
    UpdateProject,
    DeleteProject,
    ProjectViewed,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        ActivityType::CreateProject,
        ActivityType::ViewProject,
        ActivityType::UploadImage,
        ActivityType::UpdateProject,
        ActivityType::DeleteProject,
        ActivityType::ProjectViewed,
    ];

    /// ワイヤ上のタグ文字列を返す。
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::CreateProject => "CREATE_PROJECT",
            ActivityType::ViewProject => "VIEW_PROJECT",
            ActivityType::UploadImage => "UPLOAD_IMAGE",
            ActivityType::UpdateProject => "UPDATE_PROJECT",
            ActivityType::DeleteProject => "DELETE_PROJECT",
            ActivityType::ProjectViewed => "PROJECT_VIEWED",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知のアクティビティ種別タグ。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity type: {0}")]
pub struct UnknownActivityType(pub String);

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownActivityType(s.to_string()))
    }
}

/// ActivityEvent はユーザー操作の発生時に生成される不変のイベントレコード。
///
/// `(day, event_time, event_id)` がメッセージキーとなる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// イベント ID（UUID v4、再利用しない）
    pub event_id: String,
    /// 操作主体のユーザー ID（デバッグ用途ではプレースホルダー可）
    pub user_id: String,
    pub activity_type: ActivityType,
    /// エポックミリ秒（プロデューサー側の時計）
    pub event_time: i64,
    /// `event_time` の UTC 日付（YYYY-MM-DD）
    pub day: String,
    /// 対象リソースの ID。該当しない場合は空文字列。
    pub entity_id: String,
    /// 任意の構造化ペイロードを JSON 文字列化したもの
    pub metadata_json: String,
}

impl ActivityEvent {
    /// 現在時刻で新しいイベントを生成する。
    pub fn new(user_id: impl Into<String>, activity_type: ActivityType) -> Self {
        Self::at(user_id, activity_type, Utc::now())
    }

    /// 指定時刻で新しいイベントを生成する。`day` は UTC で導出する。
    pub fn at(
        user_id: impl Into<String>,
        activity_type: ActivityType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            activity_type,
            event_time: occurred_at.timestamp_millis(),
            day: occurred_at.format(DAY_FORMAT).to_string(),
            entity_id: String::new(),
            metadata_json: "{}".to_string(),
        }
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    pub fn with_metadata(mut self, metadata: &serde_json::Value) -> Self {
        self.metadata_json = metadata.to_string();
        self
    }

    /// メッセージキーを構成する 3 フィールドを返す。
    pub fn key(&self) -> EventKey<'_> {
        EventKey {
            day: &self.day,
            event_time: self.event_time,
            event_id: &self.event_id,
        }
    }
}

/// EventKey はパーティション・順序付けに使うキーレコード。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKey<'a> {
    pub day: &'a str,
    pub event_time: i64,
    pub event_id: &'a str,
}

pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";

/// エポックミリ秒から UTC 日付文字列を導出する。範囲外の場合は None。
pub fn day_for(event_time_ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(event_time_ms)
        .map(|t| t.format(DAY_FORMAT).to_string())
}
