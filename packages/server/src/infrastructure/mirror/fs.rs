//! ファイルシステムを使った RoomMirror 実装
//!
//! レイアウトはミラーの外部契約に従う:
//!
//! ```text
//! {base_dir}/rooms/{roomId}/users/{username}.json
//! ```
//!
//! `RoomId` と `Username` は値オブジェクトの検証によりパスとして安全な
//! 文字しか含まない。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::{MirrorError, MirrorRecord, RoomId, RoomMirror, Username};

/// ファイルシステムを使った RoomMirror 実装
pub struct FsRoomMirror {
    base_dir: PathBuf,
}

impl FsRoomMirror {
    /// 新しい FsRoomMirror を作成
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn rooms_dir(&self) -> PathBuf {
        self.base_dir.join("rooms")
    }

    fn users_dir(&self, room_id: &RoomId) -> PathBuf {
        self.rooms_dir().join(room_id.as_str()).join("users")
    }

    fn user_path(&self, room_id: &RoomId, username: &str) -> PathBuf {
        self.users_dir(room_id).join(format!("{username}.json"))
    }
}

/// NotFound を成功として扱う削除
async fn remove_file_if_exists(path: &Path) -> Result<(), MirrorError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl RoomMirror for FsRoomMirror {
    async fn put(&self, room_id: &RoomId, record: &MirrorRecord) -> Result<(), MirrorError> {
        let dir = self.users_dir(room_id);
        fs::create_dir_all(&dir).await?;
        let json = serde_json::to_vec_pretty(record)?;
        fs::write(self.user_path(room_id, &record.username), json).await?;
        Ok(())
    }

    async fn delete(&self, room_id: &RoomId, username: &Username) -> Result<(), MirrorError> {
        remove_file_if_exists(&self.user_path(room_id, username.as_str())).await?;
        // 空になったディレクトリは片付ける（残っていても害はないので失敗は無視）
        let users_dir = self.users_dir(room_id);
        if fs::remove_dir(&users_dir).await.is_ok() {
            let _ = fs::remove_dir(self.rooms_dir().join(room_id.as_str())).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), MirrorError> {
        match fs::remove_dir_all(self.rooms_dir()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomIdFactory;

    fn test_mirror() -> (FsRoomMirror, PathBuf) {
        let base = std::env::temp_dir().join(format!("tamariba-mirror-{}", uuid::Uuid::new_v4()));
        (FsRoomMirror::new(base.clone()), base)
    }

    fn record(name: &str) -> MirrorRecord {
        MirrorRecord {
            username: name.to_string(),
            originator: false,
            connection_id: None,
            score: 0,
            answer_order: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_put_writes_record_file() {
        // テスト項目: put でメンバーレコードのファイルが作成され、内容が読み戻せる
        // given (前提条件):
        let (mirror, base) = test_mirror();
        let room_id = RoomIdFactory::generate();

        // when (操作):
        mirror.put(&room_id, &record("alice")).await.unwrap();

        // then (期待する結果):
        let path = base
            .join("rooms")
            .join(room_id.as_str())
            .join("users")
            .join("alice.json");
        let json = tokio::fs::read_to_string(&path).await.unwrap();
        let restored: MirrorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record("alice"));

        let _ = tokio::fs::remove_dir_all(&base).await;
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_is_idempotent() {
        // テスト項目: delete でレコードが消え、再実行してもエラーにならない
        // given (前提条件):
        let (mirror, base) = test_mirror();
        let room_id = RoomIdFactory::generate();
        let alice = Username::new("alice".to_string()).unwrap();
        mirror.put(&room_id, &record("alice")).await.unwrap();

        // when (操作):
        mirror.delete(&room_id, &alice).await.unwrap();
        mirror.delete(&room_id, &alice).await.unwrap();

        // then (期待する結果):
        let path = base
            .join("rooms")
            .join(room_id.as_str())
            .join("users")
            .join("alice.json");
        assert!(!path.exists());

        let _ = tokio::fs::remove_dir_all(&base).await;
    }

    #[tokio::test]
    async fn test_clear_wipes_all_rooms() {
        // テスト項目: clear でミラー全体が破棄される（未作成でも成功する）
        // given (前提条件):
        let (mirror, base) = test_mirror();
        let room_id = RoomIdFactory::generate();
        mirror.put(&room_id, &record("alice")).await.unwrap();

        // when (操作):
        mirror.clear().await.unwrap();
        // 何もない状態での clear も成功する
        mirror.clear().await.unwrap();

        // then (期待する結果):
        assert!(!base.join("rooms").exists());

        let _ = tokio::fs::remove_dir_all(&base).await;
    }
}
