//! Broadcast Fanout
//!
//! ルームスコープのブロードキャスト。配送先は呼び出し時点で
//! Connection Registry に束縛されている接続のみで決まる（遅れて参加した
//! 接続が進行中の fanout を受け取ることはなく、直前に退室した接続にも
//! 届かない）。個々の宛先への配送はベストエフォート。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, MessagePusher, RoomId};

/// ルームスコープのブロードキャスト
pub struct RoomBroadcaster {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomBroadcaster {
    /// 新しい RoomBroadcaster を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// ルームに束縛されている接続へイベントを配送する
    ///
    /// # Arguments
    ///
    /// * `room_id` - 配送先のルーム
    /// * `payload` - 送信する JSON ペイロード
    /// * `exclude` - 除外する接続（イベントの発生元など）
    pub async fn broadcast_to_room(
        &self,
        room_id: &RoomId,
        payload: &str,
        exclude: Option<&ConnectionId>,
    ) {
        let mut targets = self.registry.connections_in_room(room_id).await;
        if let Some(exclude) = exclude {
            targets.retain(|connection_id| connection_id != exclude);
        }
        if targets.is_empty() {
            return;
        }

        if let Err(e) = self.message_pusher.broadcast(targets, payload).await {
            tracing::warn!("broadcast to room '{}' failed: {}", room_id, e);
        }
    }
}
