//! Write-behind ミラーワーカー
//!
//! ミラーへの書き込みを有界キューに積み、バックグラウンドタスクが順に
//! バックエンドへ適用します。投入（`MirrorSink`）は即座に戻るため、
//! ミラーのレイテンシや失敗がブロードキャストや他の接続の処理を
//! 遅らせることはありません。
//!
//! キューが溢れた場合、コマンドは破棄されます（ミラーはベストエフォート）。

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::domain::{MirrorRecord, MirrorSink, RoomId, RoomMirror, Username};

/// ミラーキューの容量
pub const MIRROR_QUEUE_CAPACITY: usize = 1024;

/// ワーカーへ渡すコマンド
#[derive(Debug)]
enum MirrorCommand {
    Put {
        room_id: RoomId,
        record: MirrorRecord,
    },
    Delete {
        room_id: RoomId,
        username: Username,
    },
    Clear,
}

/// ミラー書き込みの投入口
///
/// `MirrorSink` の実装。clone して共有できる。
#[derive(Clone)]
pub struct MirrorWriter {
    tx: mpsc::Sender<MirrorCommand>,
}

impl MirrorWriter {
    /// ワーカータスクを起動して投入口を返す
    pub fn spawn(mirror: Arc<dyn RoomMirror>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(MIRROR_QUEUE_CAPACITY);
        let handle = tokio::spawn(run_worker(mirror, rx));
        (Self { tx }, handle)
    }

    fn enqueue(&self, command: MirrorCommand) {
        // 呼び出し元を待たせない。キューが詰まっていたら破棄する
        if let Err(e) = self.tx.try_send(command) {
            tracing::warn!("mirror queue rejected command, dropping: {}", e);
        }
    }
}

impl MirrorSink for MirrorWriter {
    fn put(&self, room_id: RoomId, record: MirrorRecord) {
        self.enqueue(MirrorCommand::Put { room_id, record });
    }

    fn delete(&self, room_id: RoomId, username: Username) {
        self.enqueue(MirrorCommand::Delete { room_id, username });
    }

    fn clear(&self) {
        self.enqueue(MirrorCommand::Clear);
    }
}

async fn run_worker(mirror: Arc<dyn RoomMirror>, mut rx: mpsc::Receiver<MirrorCommand>) {
    while let Some(command) = rx.recv().await {
        let result = match &command {
            MirrorCommand::Put { room_id, record } => mirror.put(room_id, record).await,
            MirrorCommand::Delete { room_id, username } => mirror.delete(room_id, username).await,
            MirrorCommand::Clear => mirror.clear().await,
        };
        if let Err(e) = result {
            // インメモリ状態が正。ミラーの失敗はログに残すだけで続行する
            tracing::warn!("mirror write failed: {}", e);
        }
    }
    tracing::debug!("mirror worker stopped");
}
