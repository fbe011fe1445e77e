//! InMemory Connection Registry 実装
//!
//! 接続 ID から (ルーム, ユーザー名) への束縛を 1 枚の HashMap で管理します。
//! `bind` / `unbind` は Mutex により原子的で、切断と再接続の競合は
//! ここでの操作順序で決着します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Binding, ConnectionId, ConnectionRegistry, RoomId, Username};

/// インメモリ Connection Registry 実装
pub struct InMemoryConnectionRegistry {
    bindings: Mutex<HashMap<ConnectionId, Binding>>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new() -> Self {
        Self {
            bindings: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn bind(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        username: Username,
    ) -> Option<Binding> {
        let mut bindings = self.bindings.lock().await;
        bindings.insert(connection_id, Binding { room_id, username })
    }

    async fn unbind(&self, connection_id: &ConnectionId) -> Option<Binding> {
        let mut bindings = self.bindings.lock().await;
        bindings.remove(connection_id)
    }

    async fn lookup(&self, connection_id: &ConnectionId) -> Option<Binding> {
        let bindings = self.bindings.lock().await;
        bindings.get(connection_id).cloned()
    }

    async fn connections_in_room(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let bindings = self.bindings.lock().await;
        let mut connections: Vec<ConnectionId> = bindings
            .iter()
            .filter(|(_, binding)| &binding.room_id == room_id)
            .map(|(connection_id, _)| *connection_id)
            .collect();
        // 列挙順を決定的にする
        connections.sort();
        connections
    }
}
