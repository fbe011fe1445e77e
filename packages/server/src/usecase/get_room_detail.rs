//! UseCase: ルーム詳細取得
//!
//! HTTP のルーム参照と、メンバー変更時の `roomDetails` ブロードキャストの
//! 再計算（配信時点の Store の状態から作る）の両方で使われる。

use std::sync::Arc;

use crate::domain::{RepositoryError, Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルームのスナップショットを取得する
    pub async fn execute(&self, room_id: &RoomId) -> Result<Room, GetRoomDetailError> {
        self.repository
            .get_room(room_id)
            .await
            .map_err(|e| match e {
                RepositoryError::RoomNotFound(id) => GetRoomDetailError::RoomNotFound(id),
            })
    }
}
