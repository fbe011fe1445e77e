//! UseCase: ルーム作成
//!
//! ルームの作成は常に成功する（ID は Store 側で衝突チェック付きで生成される）。
//! 接続付きで呼ばれた場合は作成者を新しいルームへ束縛し、別のルームに
//! 束縛されていた接続なら旧ルームから自動退室させる。

use std::sync::Arc;

use tamariba_shared::time::get_timestamp;

use crate::domain::{
    ConnectionId, ConnectionRegistry, Member, MirrorRecord, MirrorSink, Room, RoomRepository,
    Timestamp, Username,
};

use super::leave_room::{Departure, LeaveRoomUseCase};

/// ルーム作成の結果
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoomOutcome {
    /// 作成直後のルームのスナップショット
    pub room: Room,
    /// 作成者（Originator）
    pub member: Member,
    /// 旧ルームからの自動退室（あれば）
    pub departed: Option<Departure>,
}

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    mirror: Arc<dyn MirrorSink>,
    leave: Arc<LeaveRoomUseCase>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        mirror: Arc<dyn MirrorSink>,
        leave: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            repository,
            registry,
            mirror,
            leave,
        }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `username` - 作成者のユーザー名（Originator になる）
    /// * `connection` - 作成者の接続。HTTP 経由の作成では None
    pub async fn execute(
        &self,
        username: Username,
        connection: Option<ConnectionId>,
    ) -> CreateRoomOutcome {
        let created_at = Timestamp::new(get_timestamp());
        let room = self
            .repository
            .create_room(username.clone(), created_at)
            .await;

        // 接続があれば新しいルームへ束縛する。旧束縛は上書きで返る
        let previous = match connection {
            Some(connection_id) => {
                self.registry
                    .bind(connection_id, room.id.clone(), username.clone())
                    .await
            }
            None => None,
        };

        // 別ルームに居た接続は旧ルームから自動退室させる
        // （新規ルームの ID とは衝突しないため、ロック順序の問題はない）
        let mut departed = None;
        if let (Some(previous), Some(connection_id)) = (previous, connection.as_ref()) {
            departed = Some(self.leave.depart(previous, connection_id).await);
        }

        let member = room
            .member(&username)
            .cloned()
            .expect("creator is inserted on room creation");
        self.mirror.put(room.id.clone(), MirrorRecord::from(&member));

        tracing::info!("user '{}' created room '{}'", username, room.id);
        CreateRoomOutcome {
            room,
            member,
            departed,
        }
    }
}
