//! WebSocket event DTOs.
//!
//! イベント名とペイロード形状の組は閉じた集合として定義し、
//! ルーター境界（UI 層）で deserialize と同時に検証します。
//! ここに無いイベントはパースに失敗し、ログに記録されるだけで
//! 状態遷移もエラー応答も起こしません。
//!
//! ワイヤ形式は `{"event": "...", "data": {...}}`。

use serde::{Deserialize, Serialize};

/// クライアント → サーバのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    CreateRoom { username: String },
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, username: String },
    /// 引数なし。対象は Connection Registry の束縛から解決される
    LeaveRoom,
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_id: String,
        username: String,
        message: String,
    },
}

/// サーバ → クライアントのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String, username: String },
    #[serde(rename_all = "camelCase")]
    JoinRoomSuccess {
        room_id: String,
        members: Vec<MemberDto>,
    },
    #[serde(rename_all = "camelCase")]
    UserJoined { username: String },
    #[serde(rename_all = "camelCase")]
    UserLeft { username: String },
    #[serde(rename_all = "camelCase")]
    Message { username: String, text: String },
    #[serde(rename_all = "camelCase")]
    ErrorMessage { message: String },
    /// 配信時点の Room Store の状態から再計算されたメンバー一覧
    #[serde(rename_all = "camelCase")]
    RoomDetails {
        room_id: String,
        members: Vec<MemberDto>,
    },
}

/// ルームメンバーの転送表現
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub username: String,
    pub originator: bool,
    /// 現在接続中か（永続ミラー経由でのみ知られているメンバーは false）
    pub connected: bool,
    pub score: i64,
    pub answer_order: Option<i64>,
    pub active: bool,
}
