//! UseCase: 退室処理
//!
//! 明示的な `leaveRoom` イベントと接続断（disconnect）の両方の入口を持ち、
//! どちらも同じ退室経路（`depart`）に合流します。切断のクリーンアップが
//! 明示的な退室と違う経路を通ると、死んだ接続に束縛されたメンバーが
//! Room Store に残り続けるため、経路は必ず 1 本にします。
//!
//! ## 競合の決着
//!
//! - どのイベントが勝つかは Registry の `unbind` が原子的に決める。
//!   束縛が既に無ければクリーンアップ自体が走らない。
//! - Store 側の削除は「まだこの接続に束縛されているメンバー」に限定する。
//!   後続の再 join が先にメンバーを上書きしていた場合は何もしない。

use std::sync::Arc;

use crate::domain::{
    Binding, ConnectionId, ConnectionRegistry, MirrorSink, RoomId, RoomRepository, Username,
};

use super::{error::LeaveRoomError, room_locks::RoomLocks};

/// 退室の結果
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub room_id: RoomId,
    pub username: Username,
    /// Room Store から実際にメンバーが削除されたか
    /// （再 join に追い越されていた場合は false）
    pub removed: bool,
    /// この退室でルーム自体が削除されたか
    pub room_deleted: bool,
}

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    room_locks: Arc<RoomLocks>,
    mirror: Arc<dyn MirrorSink>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        room_locks: Arc<RoomLocks>,
        mirror: Arc<dyn MirrorSink>,
    ) -> Self {
        Self {
            repository,
            registry,
            room_locks,
            mirror,
        }
    }

    /// 明示的な `leaveRoom` イベントを実行
    ///
    /// # Returns
    ///
    /// * `Ok(Departure)` - 退室成功
    /// * `Err(LeaveRoomError::NotInRoom)` - 接続がどのルームにも束縛されていない
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Departure, LeaveRoomError> {
        let binding = self
            .registry
            .unbind(connection_id)
            .await
            .ok_or(LeaveRoomError::NotInRoom)?;
        Ok(self.depart(binding, connection_id).await)
    }

    /// 接続断を処理する。束縛が無ければ何もしない（エラーにもしない）
    pub async fn on_disconnect(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let binding = self.registry.unbind(connection_id).await?;
        Some(self.depart(binding, connection_id).await)
    }

    /// 共通の退室経路: Store からメンバーを削除し、ミラーのレコードを消す
    ///
    /// 呼び出し時点で Registry の束縛は既に解決済み（unbind または上書き）
    /// であること。
    pub(crate) async fn depart(
        &self,
        binding: Binding,
        connection_id: &ConnectionId,
    ) -> Departure {
        let Binding { room_id, username } = binding;

        let outcome = {
            let _guard = self.room_locks.acquire(&room_id).await;
            self.repository
                .leave_room(&room_id, &username, Some(connection_id))
                .await
        };

        if outcome.removed.is_some() {
            self.mirror.delete(room_id.clone(), username.clone());
        }
        if outcome.room_deleted {
            self.room_locks.discard(&room_id).await;
            tracing::info!("room '{}' deleted after last member left", room_id);
        }

        Departure {
            room_id,
            username,
            removed: outcome.removed.is_some(),
            room_deleted: outcome.room_deleted,
        }
    }
}
