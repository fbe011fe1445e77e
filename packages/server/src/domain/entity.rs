//! ドメイン層のエンティティ
//!
//! Room と Member の状態遷移はすべてこのモジュールのメソッドを経由します。
//! 並行制御（ロック）は Infrastructure / UseCase 層の責務であり、
//! エンティティ自身は純粋な状態と遷移のみを持ちます。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value_object::{ConnectionId, RoomId, Timestamp, Username};

/// ルーム内での役割
///
/// Originator はルーム作成者。ルームごとに必ず 1 人で、作成時に決まり、
/// 自動的に再割り当てされることはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Ordinary,
    Originator,
}

/// ルームの参加メンバー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub username: Username,
    /// 現在束縛されている接続。永続ミラー経由でのみ知られているメンバーは None
    pub connection: Option<ConnectionId>,
    pub role: MemberRole,
    // 以下はゲーム進行メタデータ。コーディネータは保存・転送するだけで解釈しない
    pub score: i64,
    pub answer_order: Option<i64>,
    pub active: bool,
}

impl Member {
    pub fn new(username: Username, role: MemberRole, connection: Option<ConnectionId>) -> Self {
        Self {
            username,
            connection,
            role,
            score: 0,
            answer_order: None,
            active: true,
        }
    }

    pub fn is_originator(&self) -> bool {
        self.role == MemberRole::Originator
    }
}

/// ルーム
///
/// メンバーはユーザー名をキーとするマップで保持する（ルーム内で一意）。
/// `BTreeMap` を使うことでスナップショットの列挙順が決定的になる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub members: BTreeMap<Username, Member>,
    pub created_at: Timestamp,
}

impl Room {
    /// ルームを新規作成する。作成者が唯一のメンバーとなり、Originator 役を持つ
    pub fn new(id: RoomId, originator: Username, created_at: Timestamp) -> Self {
        let mut members = BTreeMap::new();
        members.insert(
            originator.clone(),
            Member::new(originator, MemberRole::Originator, None),
        );
        Self {
            id,
            members,
            created_at,
        }
    }

    /// メンバーを追加または上書きする（last join wins）
    ///
    /// 既存メンバーの場合はレコードを引き継ぎ、接続だけを置き換える：
    /// 役割（Originator は自動では移らない）とゲームメタデータは保持し、
    /// `active` は true に戻す。戻り値は (join 後のメンバー, 上書きされた旧メンバー)。
    pub fn upsert_member(
        &mut self,
        username: Username,
        connection: Option<ConnectionId>,
    ) -> (Member, Option<Member>) {
        match self.members.get_mut(&username) {
            Some(existing) => {
                let replaced = existing.clone();
                existing.connection = connection;
                existing.active = true;
                (existing.clone(), Some(replaced))
            }
            None => {
                let member = Member::new(username.clone(), MemberRole::Ordinary, connection);
                self.members.insert(username, member.clone());
                (member, None)
            }
        }
    }

    /// メンバーを削除する（冪等: 不在なら None）
    pub fn remove_member(&mut self, username: &Username) -> Option<Member> {
        self.members.remove(username)
    }

    pub fn member(&self, username: &Username) -> Option<&Member> {
        self.members.get(username)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_alice() -> (Room, Username) {
        let alice = Username::new("alice".to_string()).unwrap();
        let room = Room::new(
            crate::domain::RoomIdFactory::generate(),
            alice.clone(),
            Timestamp::new(1000),
        );
        (room, alice)
    }

    #[test]
    fn test_new_room_has_single_originator() {
        // テスト項目: 新規ルームは作成者のみをメンバーに持ち、作成者が Originator である
        // given (前提条件) / when (操作):
        let (room, alice) = room_with_alice();

        // then (期待する結果):
        assert_eq!(room.member_count(), 1);
        let member = room.member(&alice).unwrap();
        assert!(member.is_originator());
        assert_eq!(member.connection, None);
        assert!(member.active);
    }

    #[test]
    fn test_upsert_new_member_is_ordinary() {
        // テスト項目: 後から参加したメンバーは Ordinary 役で追加される
        // given (前提条件):
        let (mut room, _alice) = room_with_alice();
        let bob = Username::new("bob".to_string()).unwrap();
        let conn = ConnectionId::new();

        // when (操作):
        let (member, replaced) = room.upsert_member(bob.clone(), Some(conn));

        // then (期待する結果):
        assert_eq!(replaced, None);
        assert_eq!(member.role, MemberRole::Ordinary);
        assert_eq!(member.connection, Some(conn));
        assert_eq!(room.member_count(), 2);
    }

    #[test]
    fn test_upsert_existing_member_keeps_role_and_score() {
        // テスト項目: 同名メンバーの再 join は接続のみ置き換え、役割とスコアを保持する
        // given (前提条件):
        let (mut room, alice) = room_with_alice();
        room.members.get_mut(&alice).unwrap().score = 42;
        room.members.get_mut(&alice).unwrap().active = false;
        let old_conn = ConnectionId::new();
        room.members.get_mut(&alice).unwrap().connection = Some(old_conn);
        let new_conn = ConnectionId::new();

        // when (操作):
        let (member, replaced) = room.upsert_member(alice.clone(), Some(new_conn));

        // then (期待する結果): last join wins、ただし役割とゲームメタデータは引き継ぐ
        assert_eq!(replaced.as_ref().unwrap().connection, Some(old_conn));
        assert_eq!(member.connection, Some(new_conn));
        assert_eq!(member.role, MemberRole::Originator);
        assert_eq!(member.score, 42);
        assert!(member.active);
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_remove_member_is_idempotent() {
        // テスト項目: メンバー削除は冪等（2 回目は None）
        // given (前提条件):
        let (mut room, alice) = room_with_alice();

        // when (操作):
        let first = room.remove_member(&alice);
        let second = room.remove_member(&alice);

        // then (期待する結果):
        assert!(first.is_some());
        assert_eq!(second, None);
        assert!(room.is_empty());
    }
}
