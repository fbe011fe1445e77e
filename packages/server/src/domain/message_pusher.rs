//! MessagePusher trait 定義
//!
//! クライアントへのメッセージ送信の抽象化。WebSocket などの具体的な
//! 送信手段は Infrastructure 層が実装します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信のインターフェース
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録する
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除する
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続へ送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続へ送信する
    ///
    /// 個々の宛先への送信はベストエフォートであり、一部の失敗が
    /// 他の宛先への配送を妨げてはならない。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
