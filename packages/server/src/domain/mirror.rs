//! 永続ミラーの trait 定義
//!
//! インメモリの Room Store を外部ストレージへベストエフォートで複製するための
//! インターフェース。ミラーの失敗がインメモリ状態を巻き戻したり、
//! クライアントへ伝播したりすることはありません。
//!
//! - [`RoomMirror`]: バックエンド（ファイルシステムなど）の書き込みインターフェース
//! - [`MirrorSink`]: UseCase 層から見た fire-and-forget の投入口。
//!   実装（キュー + ワーカー）は Infrastructure 層にある。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    entity::Member,
    error::MirrorError,
    value_object::{RoomId, Username},
};

/// ミラーに書き込まれるメンバーレコード
///
/// レイアウト: `rooms/{roomId}/users/{username}` 配下に 1 メンバー 1 レコード。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRecord {
    pub username: String,
    pub originator: bool,
    pub connection_id: Option<String>,
    pub score: i64,
    pub answer_order: Option<i64>,
    pub active: bool,
}

impl From<&Member> for MirrorRecord {
    fn from(member: &Member) -> Self {
        Self {
            username: member.username.as_str().to_string(),
            originator: member.is_originator(),
            connection_id: member.connection.map(|c| c.to_string()),
            score: member.score,
            answer_order: member.answer_order,
            active: member.active,
        }
    }
}

/// 永続ミラーのバックエンド
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomMirror: Send + Sync {
    /// メンバーレコードを書き込む（上書き）
    async fn put(&self, room_id: &RoomId, record: &MirrorRecord) -> Result<(), MirrorError>;

    /// メンバーレコードを削除する
    async fn delete(&self, room_id: &RoomId, username: &Username) -> Result<(), MirrorError>;

    /// ミラー全体を破棄する（プロセス起動時に呼ばれる）
    async fn clear(&self) -> Result<(), MirrorError>;
}

/// ミラー書き込みの投入口（fire-and-forget）
///
/// インメモリの変更経路からミラーの I/O レイテンシを切り離すための
/// インターフェース。投入は即座に戻り、失敗はログに記録されるのみ。
pub trait MirrorSink: Send + Sync {
    fn put(&self, room_id: RoomId, record: MirrorRecord);
    fn delete(&self, room_id: RoomId, username: Username);
    fn clear(&self);
}

/// ミラー無効時の MirrorSink 実装
pub struct NullMirrorSink;

impl MirrorSink for NullMirrorSink {
    fn put(&self, _room_id: RoomId, _record: MirrorRecord) {}
    fn delete(&self, _room_id: RoomId, _username: Username) {}
    fn clear(&self) {}
}
