//! UseCase: ルーム参加
//!
//! ## 不変条件
//!
//! - ルームが存在しなければ `RoomNotFound` を返し、状態は一切変更しない
//!   （エラーは呼び出し側だけに返る）。
//! - 同名メンバーの join は上書き（last join wins）。上書きされた旧メンバーの
//!   接続束縛は破棄され、有効な束縛は常に 1 つだけ残る。
//! - 別ルームに束縛されていた接続は旧ルームから自動退室する。
//!
//! ## ロック順序
//!
//! 対象ルームの直列化ロックを保持するのは Store への join と Registry の
//! 付け替えまで。旧ルームからの自動退室はロックを手放してから行う
//! （2 つのルームのロックを同時に持つとロック順序の反転で
//! デッドロックし得るため）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRegistry, Member, MirrorRecord, MirrorSink, RepositoryError, Room,
    RoomId, RoomRepository, Username,
};

use super::{
    error::JoinRoomError,
    leave_room::{Departure, LeaveRoomUseCase},
    room_locks::RoomLocks,
};

/// ルーム参加の結果
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRoomOutcome {
    /// join 直後のルームのスナップショット
    pub room: Room,
    /// join したメンバー
    pub member: Member,
    /// 旧ルームからの自動退室（あれば）
    pub departed: Option<Departure>,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    room_locks: Arc<RoomLocks>,
    mirror: Arc<dyn MirrorSink>,
    leave: Arc<LeaveRoomUseCase>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        room_locks: Arc<RoomLocks>,
        mirror: Arc<dyn MirrorSink>,
        leave: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            repository,
            registry,
            room_locks,
            mirror,
            leave,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 参加先のルーム
    /// * `username` - 参加者のユーザー名
    /// * `connection` - 参加者の接続。HTTP 経由の参加では None
    pub async fn execute(
        &self,
        room_id: RoomId,
        username: Username,
        connection: Option<ConnectionId>,
    ) -> Result<JoinRoomOutcome, JoinRoomError> {
        let (joined, previous) = {
            let _guard = self.room_locks.acquire(&room_id).await;

            let joined = self
                .repository
                .join_room(&room_id, username.clone(), connection)
                .await
                .map_err(|e| match e {
                    RepositoryError::RoomNotFound(id) => JoinRoomError::RoomNotFound(id),
                })?;

            // 上書きされた旧メンバーが別の接続に束縛されていたら、その束縛を破棄する
            if let Some(replaced) = &joined.replaced {
                if let Some(stale) = replaced.connection.as_ref() {
                    if connection.as_ref() != Some(stale) {
                        self.registry.unbind(stale).await;
                        tracing::debug!(
                            "stale binding for connection '{}' removed (superseded by re-join)",
                            stale
                        );
                    }
                }
            }

            // この接続を新しいルームへ束縛する。旧束縛は上書きで返る
            let previous = match connection {
                Some(connection_id) => {
                    self.registry
                        .bind(connection_id, room_id.clone(), username.clone())
                        .await
                }
                None => None,
            };

            (joined, previous)
        };

        // 旧ルームからの自動退室（対象ルームのロックを手放してから）
        let mut departed = None;
        if let (Some(previous), Some(connection_id)) = (previous, connection.as_ref()) {
            if previous.room_id != room_id || previous.username != username {
                departed = Some(self.leave.depart(previous, connection_id).await);
            }
        }

        self.mirror
            .put(room_id.clone(), MirrorRecord::from(&joined.member));

        tracing::info!("user '{}' joined room '{}'", username, room_id);
        Ok(JoinRoomOutcome {
            room: joined.room,
            member: joined.member,
            departed,
        })
    }
}
