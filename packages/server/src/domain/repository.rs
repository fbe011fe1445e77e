//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{Member, Room},
    error::RepositoryError,
    value_object::{ConnectionId, RoomId, Timestamp, Username},
};

/// `join_room` の結果
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRoom {
    /// join 直後のルームのスナップショット
    pub room: Room,
    /// join したメンバー
    pub member: Member,
    /// 上書きされた同名の旧メンバー（last join wins で置き換えられたもの）
    pub replaced: Option<Member>,
}

/// `leave_room` の結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeaveOutcome {
    /// 実際に削除されたメンバー（不在・接続ガード不一致のときは None）
    pub removed: Option<Member>,
    /// この退室によってルーム自体が削除されたか
    pub room_deleted: bool,
}

/// Room Store のインターフェース
///
/// すべての変更操作は並行呼び出しに対して原子的であること。
/// ルーム単位の直列化はルームごとに行い、無関係なルーム同士が
/// 互いをブロックしないこと。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを新規作成する
    ///
    /// ルーム ID は内部で生成し、既存ルームと衝突した場合は再生成する。
    /// 既存ルームが原因で失敗することはない。作成者が唯一のメンバー
    /// （Originator）となる。
    async fn create_room(&self, originator: Username, created_at: Timestamp) -> Room;

    /// ルームにメンバーを追加または上書きする（last join wins）
    ///
    /// ルームが存在しない場合は `RoomNotFound` を返し、状態は一切変更しない。
    async fn join_room(
        &self,
        room_id: &RoomId,
        username: Username,
        connection: Option<ConnectionId>,
    ) -> Result<JoinedRoom, RepositoryError>;

    /// ルームからメンバーを削除する（冪等: 不在なら何もしない）
    ///
    /// `only_if_connection` が Some の場合、メンバーがまだその接続に
    /// 束縛されているときに限り削除する。切断のクリーンアップと
    /// 再 join の競合をここで決着させる。
    ///
    /// 削除によってルームが空になった場合、empty-room deletion ポリシーが
    /// 有効ならルーム自体を削除する。
    async fn leave_room(
        &self,
        room_id: &RoomId,
        username: &Username,
        only_if_connection: Option<&ConnectionId>,
    ) -> LeaveOutcome;

    /// ルームのスナップショットを取得する
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 全ルームのスナップショットを取得する（作成時刻順）
    ///
    /// 各ルームのスナップショットは内部的に一貫しており、
    /// 変更途中の部分的な状態が見えることはない。
    async fn list_rooms(&self) -> Vec<Room>;
}
