//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## ロック構成
//!
//! - 外側: `RwLock<HashMap<RoomId, RoomCell>>` — ルームの追加・削除のみ write を取る
//! - 内側: ルームごとの `Mutex<Option<Room>>` — メンバーの変更はここで直列化される
//!
//! 無関係なルームへの操作が互いをブロックしないよう、外側のロックは
//! ルームのハンドル（`Arc`）を取り出す間だけ保持します。ルーム削除は
//! セルを `None` にしてからマップから外すため、削除と競合したハンドル保持者は
//! 空のセルを観測して `RoomNotFound` として扱えます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    ConnectionId, JoinedRoom, LeaveOutcome, RepositoryError, Room, RoomId, RoomIdFactory,
    RoomRepository, Timestamp, Username,
};

/// ルーム 1 件分のセル。削除済みルームは `None`
type RoomCell = Arc<Mutex<Option<Room>>>;

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, RoomCell>>,
    /// 最後のメンバーが退室したルームを削除するか（設定フラグ）
    delete_empty_rooms: bool,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(delete_empty_rooms: bool) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            delete_empty_rooms,
        }
    }

    /// ルームのハンドルを取り出す。外側のロックはここでしか読まない
    async fn room_cell(&self, room_id: &RoomId) -> Option<RoomCell> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    fn not_found(room_id: &RoomId) -> RepositoryError {
        RepositoryError::RoomNotFound(room_id.as_str().to_string())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, originator: Username, created_at: Timestamp) -> Room {
        let mut rooms = self.rooms.write().await;

        // write ロック中の check-and-insert なので ID 生成は原子的。
        // 衝突したら再生成する（上書きはしない）
        let room_id = loop {
            let candidate = RoomIdFactory::generate();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!("room id '{}' collided, regenerating", candidate);
        };

        let room = Room::new(room_id.clone(), originator, created_at);
        rooms.insert(room_id, Arc::new(Mutex::new(Some(room.clone()))));
        room
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        username: Username,
        connection: Option<ConnectionId>,
    ) -> Result<JoinedRoom, RepositoryError> {
        let cell = self
            .room_cell(room_id)
            .await
            .ok_or_else(|| Self::not_found(room_id))?;

        let mut guard = cell.lock().await;
        // ハンドル取得とロックの間に削除されたルームは空セルになっている
        let Some(room) = guard.as_mut() else {
            return Err(Self::not_found(room_id));
        };

        let (member, replaced) = room.upsert_member(username, connection);
        Ok(JoinedRoom {
            room: room.clone(),
            member,
            replaced,
        })
    }

    async fn leave_room(
        &self,
        room_id: &RoomId,
        username: &Username,
        only_if_connection: Option<&ConnectionId>,
    ) -> LeaveOutcome {
        let Some(cell) = self.room_cell(room_id).await else {
            return LeaveOutcome::default();
        };

        // フェーズ 1: メンバー削除。ルームのロックだけを持つ
        let (removed, now_empty) = {
            let mut guard = cell.lock().await;
            let Some(room) = guard.as_mut() else {
                return LeaveOutcome::default();
            };

            let matches_connection = match (only_if_connection, room.member(username)) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(expected), Some(member)) => member.connection.as_ref() == Some(expected),
            };
            if !matches_connection {
                // 不在、または別の接続が先にメンバーを上書きしている
                return LeaveOutcome::default();
            }

            let removed = room.remove_member(username);
            (removed, room.is_empty())
        };

        if removed.is_none() || !now_empty || !self.delete_empty_rooms {
            return LeaveOutcome {
                removed,
                room_deleted: false,
            };
        }

        // フェーズ 2: 空になったルームを削除。ロックを取り直して再確認する
        // （フェーズ間の隙間に join されていたら削除しない）
        let mut rooms = self.rooms.write().await;
        let mut room_deleted = false;
        if let Some(cell) = rooms.get(room_id).cloned() {
            let mut guard = cell.lock().await;
            if guard.as_ref().is_some_and(|room| room.is_empty()) {
                *guard = None;
                drop(guard);
                rooms.remove(room_id);
                room_deleted = true;
            }
        }

        LeaveOutcome {
            removed,
            room_deleted,
        }
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let cell = self
            .room_cell(room_id)
            .await
            .ok_or_else(|| Self::not_found(room_id))?;
        let guard = cell.lock().await;
        guard.clone().ok_or_else(|| Self::not_found(room_id))
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.read().await;
        let mut snapshots = Vec::with_capacity(rooms.len());
        for cell in rooms.values() {
            let guard = cell.lock().await;
            if let Some(room) = guard.as_ref() {
                snapshots.push(room.clone());
            }
        }
        drop(rooms);

        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository の基本的な CRUD 操作
    // - last join wins の上書きセマンティクス
    // - 接続ガード付きの退室（only_if_connection）
    // - empty-room deletion ポリシーの両設定
    //
    // 【なぜこのテストが必要か】
    // - Room Store は UseCase から呼ばれる状態管理の中核
    // - 退室と再 join の競合の決着はここで保証される
    //
    // 【どのようなシナリオをテストするか】
    // 1. 作成・参加・退室の基本フロー
    // 2. 存在しないルームへの join（状態が変わらないこと）
    // 3. 退室の冪等性
    // 4. 接続ガードによる削除スキップ
    // 5. 空ルームの削除ポリシー（有効・無効）
    // ========================================

    fn username(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_room_with_sole_originator() {
        // テスト項目: 作成されたルームは作成者のみを持ち、取得できる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(true);

        // when (操作):
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;

        // then (期待する結果):
        assert_eq!(room.member_count(), 1);
        assert!(room.member(&username("alice")).unwrap().is_originator());
        let fetched = repo.get_room(&room.id).await.unwrap();
        assert_eq!(fetched, room);
    }

    #[tokio::test]
    async fn test_join_nonexistent_room_does_not_mutate() {
        // テスト項目: 存在しないルームへの join はエラーになり、状態を変更しない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(true);
        let missing = RoomIdFactory::generate();

        // when (操作):
        let result = repo.join_room(&missing, username("bob"), None).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::RoomNotFound(_))));
        assert!(repo.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_overwrites_same_username() {
        // テスト項目: 同名メンバーの join は上書きになり、旧メンバーが返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(true);
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;
        let conn1 = ConnectionId::new();
        let conn2 = ConnectionId::new();
        repo.join_room(&room.id, username("carol"), Some(conn1))
            .await
            .unwrap();

        // when (操作):
        let joined = repo
            .join_room(&room.id, username("carol"), Some(conn2))
            .await
            .unwrap();

        // then (期待する結果): carol は 1 人だけで、接続は後勝ち
        assert_eq!(joined.room.member_count(), 2);
        assert_eq!(joined.member.connection, Some(conn2));
        assert_eq!(joined.replaced.unwrap().connection, Some(conn1));
    }

    #[tokio::test]
    async fn test_leave_room_is_idempotent() {
        // テスト項目: 退室は冪等（2 回目は何も起きない）
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(false);
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;
        repo.join_room(&room.id, username("bob"), None).await.unwrap();

        // when (操作):
        let first = repo.leave_room(&room.id, &username("bob"), None).await;
        let second = repo.leave_room(&room.id, &username("bob"), None).await;

        // then (期待する結果):
        assert!(first.removed.is_some());
        assert_eq!(second, LeaveOutcome::default());
        let fetched = repo.get_room(&room.id).await.unwrap();
        assert_eq!(fetched.member_count(), 1);
    }

    #[tokio::test]
    async fn test_leave_room_with_connection_guard() {
        // テスト項目: 接続ガード付きの退室は、別の接続が上書き済みなら何もしない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(true);
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;
        let old_conn = ConnectionId::new();
        let new_conn = ConnectionId::new();
        repo.join_room(&room.id, username("bob"), Some(old_conn))
            .await
            .unwrap();
        // bob が新しい接続で再 join 済み
        repo.join_room(&room.id, username("bob"), Some(new_conn))
            .await
            .unwrap();

        // when (操作): 古い接続の切断クリーンアップが走る
        let outcome = repo
            .leave_room(&room.id, &username("bob"), Some(&old_conn))
            .await;

        // then (期待する結果): 再 join 済みのメンバーは削除されない
        assert_eq!(outcome.removed, None);
        let fetched = repo.get_room(&room.id).await.unwrap();
        assert_eq!(
            fetched.member(&username("bob")).unwrap().connection,
            Some(new_conn)
        );
    }

    #[tokio::test]
    async fn test_empty_room_is_deleted_when_policy_enabled() {
        // テスト項目: ポリシー有効時、最後のメンバーの退室でルームが削除される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(true);
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;

        // when (操作):
        let outcome = repo.leave_room(&room.id, &username("alice"), None).await;

        // then (期待する結果):
        assert!(outcome.room_deleted);
        assert!(matches!(
            repo.get_room(&room.id).await,
            Err(RepositoryError::RoomNotFound(_))
        ));
        assert!(repo.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_room_is_kept_when_policy_disabled() {
        // テスト項目: ポリシー無効時、空になったルームが残る
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(false);
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;

        // when (操作):
        let outcome = repo.leave_room(&room.id, &username("alice"), None).await;

        // then (期待する結果):
        assert!(!outcome.room_deleted);
        let fetched = repo.get_room(&room.id).await.unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_list_rooms_ordered_by_creation() {
        // テスト項目: ルーム一覧が作成時刻順で返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(true);
        let r1 = repo.create_room(username("alice"), Timestamp::new(3000)).await;
        let r2 = repo.create_room(username("bob"), Timestamp::new(1000)).await;
        let r3 = repo.create_room(username("carol"), Timestamp::new(2000)).await;

        // when (操作):
        let rooms = repo.list_rooms().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 3);
        assert_eq!(rooms[0].id, r2.id);
        assert_eq!(rooms[1].id, r3.id);
        assert_eq!(rooms[2].id, r1.id);
    }

    #[tokio::test]
    async fn test_concurrent_joins_keep_single_member() {
        // テスト項目: 同名メンバーの並行 join でもメンバーは 1 人に収束する
        // given (前提条件):
        let repo = Arc::new(InMemoryRoomRepository::new(true));
        let room = repo.create_room(username("alice"), Timestamp::new(1000)).await;
        let conn1 = ConnectionId::new();
        let conn2 = ConnectionId::new();

        // when (操作): 2 つの接続から並行に join
        let repo1 = repo.clone();
        let repo2 = repo.clone();
        let id1 = room.id.clone();
        let id2 = room.id.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { repo1.join_room(&id1, username("carol"), Some(conn1)).await }),
            tokio::spawn(async move { repo2.join_room(&id2, username("carol"), Some(conn2)).await }),
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        // then (期待する結果): carol は 1 人で、どちらかの接続に束縛されている
        let fetched = repo.get_room(&room.id).await.unwrap();
        assert_eq!(fetched.member_count(), 2);
        let carol = fetched.member(&username("carol")).unwrap();
        assert!(carol.connection == Some(conn1) || carol.connection == Some(conn2));
    }
}
