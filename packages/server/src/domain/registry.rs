//! Connection Registry trait 定義
//!
//! 「この接続はどのルームの誰か」の唯一の情報源。
//! 明示的な leave と切断のクリーンアップは必ずこの Registry を経由します。

use async_trait::async_trait;

use super::value_object::{ConnectionId, RoomId, Username};

/// 接続とルーム内メンバーの対応
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_id: RoomId,
    pub username: Username,
}

/// Connection Registry のインターフェース
///
/// 1 つの接続は高々 1 つの束縛しか持たない。`bind` / `unbind` は
/// 切断と再接続の競合を決着させる同期ポイントであり、原子的であること。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 束縛を作成する。既存の束縛は上書きし、あれば旧束縛を返す
    async fn bind(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        username: Username,
    ) -> Option<Binding>;

    /// 束縛を削除して返す（冪等: 不在なら None）
    async fn unbind(&self, connection_id: &ConnectionId) -> Option<Binding>;

    /// 束縛を参照する（読み取り専用）
    async fn lookup(&self, connection_id: &ConnectionId) -> Option<Binding>;

    /// 指定ルームに束縛されている接続の一覧（呼び出し時点のスナップショット）
    async fn connections_in_room(&self, room_id: &RoomId) -> Vec<ConnectionId>;
}
