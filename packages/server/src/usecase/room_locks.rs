//! ルーム単位の直列化ドメイン
//!
//! Room Store と Connection Registry をまたぐ複合変更（join に伴う
//! メンバー上書きと束縛の付け替えなど）を roomId 単位で直列化します。
//! グローバルロックではないため、無関係なルームへの操作は並行に進みます。

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

/// ルームごとの mutual-exclusion ドメイン
pub struct RoomLocks {
    locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    /// 新しい RoomLocks を作成
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 指定ルームのロックを取得する（未登録なら作成）
    ///
    /// 返されたガードを保持している間、同じルームへの複合変更は直列化される。
    pub async fn acquire(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(room_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// 削除されたルームのロックを破棄する
    pub async fn discard(&self, room_id: &RoomId) {
        let mut locks = self.locks.lock().await;
        locks.remove(room_id);
    }
}

impl Default for RoomLocks {
    fn default() -> Self {
        Self::new()
    }
}
