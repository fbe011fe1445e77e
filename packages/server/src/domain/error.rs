//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// ルーム ID の形式が不正
    #[error("invalid room id: '{0}'")]
    InvalidRoomId(String),

    /// ユーザー名の形式が不正
    #[error("invalid username: '{0}'")]
    InvalidUsername(String),

    /// メッセージ内容が不正（空、または長すぎる）
    #[error("invalid message content (length: {length})")]
    InvalidMessageContent { length: usize },
}

/// Repository 操作のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// 指定されたルームが存在しない
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    /// 宛先の接続が登録されていない
    #[error("connection '{0}' not found")]
    ClientNotFound(String),

    /// 送信チャンネルへの書き込みに失敗
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 永続ミラー書き込みのエラー
///
/// ミラーはベストエフォートであり、このエラーがクライアントへ伝播することはない
/// （ログに記録されるのみ）。
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mirror serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
