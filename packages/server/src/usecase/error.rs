//! UseCase 層のエラー型
//!
//! 検証エラーは発生元の呼び出し側だけに返され、ブロードキャストされることはない。

use thiserror::Error;

/// ルーム参加のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinRoomError {
    /// 指定されたルームが存在しない
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),
}

/// 退室のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaveRoomError {
    /// 接続がどのルームにも束縛されていない
    #[error("connection is not in a room")]
    NotInRoom,
}

/// ルーム詳細取得のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GetRoomDetailError {
    /// 指定されたルームが存在しない
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),
}
