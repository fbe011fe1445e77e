//! UseCase: チャットメッセージ送信
//!
//! メッセージはルームへそのままブロードキャストされる（pass-through）。
//! 送信者の同一性検証や履歴の保存は行わない。存在しないルーム宛は
//! 配送先が空になるだけで、エラーにはならない。

use std::sync::Arc;

use crate::domain::RoomId;

use super::{broadcast::RoomBroadcaster, room_locks::RoomLocks};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    room_locks: Arc<RoomLocks>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(room_locks: Arc<RoomLocks>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            room_locks,
            broadcaster,
        }
    }

    /// メッセージをルームへブロードキャストする
    ///
    /// ルームの直列化ロックを保持したまま配送キューへ積むことで、
    /// ルーム内の配送順序がルーターの受理順序と一致する。
    ///
    /// # Arguments
    ///
    /// * `room_id` - 配送先のルーム
    /// * `json_message` - 送信する JSON メッセージ（DTO 層で生成されたもの）
    pub async fn execute(&self, room_id: &RoomId, json_message: &str) {
        let _guard = self.room_locks.acquire(room_id).await;
        self.broadcaster
            .broadcast_to_room(room_id, json_message, None)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, ConnectionRegistry, MessagePusher, RoomIdFactory, Username};
    use crate::infrastructure::{
        message_pusher::WebSocketMessagePusher, registry::InMemoryConnectionRegistry,
    };
    use tokio::sync::mpsc;

    struct Fixture {
        registry: Arc<InMemoryConnectionRegistry>,
        pusher: Arc<WebSocketMessagePusher>,
        usecase: SendMessageUseCase,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = Arc::new(RoomBroadcaster::new(registry.clone(), pusher.clone()));
        let usecase = SendMessageUseCase::new(Arc::new(RoomLocks::new()), broadcaster);
        Fixture {
            registry,
            pusher,
            usecase,
        }
    }

    async fn connect(
        f: &Fixture,
        room_id: &RoomId,
        name: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        f.pusher.register_client(connection_id, tx).await;
        f.registry
            .bind(
                connection_id,
                room_id.clone(),
                Username::new(name.to_string()).unwrap(),
            )
            .await;
        rx
    }

    #[tokio::test]
    async fn test_message_reaches_whole_room_including_sender() {
        // テスト項目: チャットは送信者を含むルーム全体へ配送される
        // given (前提条件):
        let f = fixture();
        let room_id = RoomIdFactory::generate();
        let mut alice_rx = connect(&f, &room_id, "alice").await;
        let mut bob_rx = connect(&f, &room_id, "bob").await;

        // when (操作):
        f.usecase.execute(&room_id, r#"{"event":"message"}"#).await;

        // then (期待する結果):
        assert_eq!(alice_rx.recv().await.unwrap(), r#"{"event":"message"}"#);
        assert_eq!(bob_rx.recv().await.unwrap(), r#"{"event":"message"}"#);
    }

    #[tokio::test]
    async fn test_messages_are_delivered_in_acceptance_order() {
        // テスト項目: 同一ルーム内の配送順序が受理順序と一致する
        // given (前提条件):
        let f = fixture();
        let room_id = RoomIdFactory::generate();
        let mut rx = connect(&f, &room_id, "alice").await;

        // when (操作):
        for i in 0..10 {
            f.usecase.execute(&room_id, &format!("msg-{i}")).await;
        }

        // then (期待する結果):
        for i in 0..10 {
            assert_eq!(rx.recv().await.unwrap(), format!("msg-{i}"));
        }
    }

    #[tokio::test]
    async fn test_message_to_unknown_room_is_noop() {
        // テスト項目: 存在しないルーム宛のメッセージは何も起こさない
        // given (前提条件):
        let f = fixture();
        let room_id = RoomIdFactory::generate();

        // when (操作) / then (期待する結果): エラーにならない
        f.usecase.execute(&room_id, "payload").await;
    }
}
