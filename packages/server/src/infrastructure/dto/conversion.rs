//! Conversion logic between DTOs and domain entities.

use tamariba_shared::time::timestamp_to_rfc3339;

use crate::domain::{Member, Room};
use crate::infrastructure::dto::http::{RoomDetailDto, RoomSummaryDto};
use crate::infrastructure::dto::websocket::MemberDto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Member> for MemberDto {
    fn from(member: &Member) -> Self {
        Self {
            username: member.username.as_str().to_string(),
            originator: member.is_originator(),
            connected: member.connection.is_some(),
            score: member.score,
            answer_order: member.answer_order,
            active: member.active,
        }
    }
}

/// ルームのメンバー一覧を DTO に変換（ユーザー名順）
pub fn members_dto(room: &Room) -> Vec<MemberDto> {
    room.members.values().map(MemberDto::from).collect()
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id.as_str().to_string(),
            members: room
                .members
                .keys()
                .map(|username| username.as_str().to_string())
                .collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id.as_str().to_string(),
            members: members_dto(room),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RoomIdFactory, Timestamp, Username};

    fn sample_room() -> Room {
        let alice = Username::new("alice".to_string()).unwrap();
        let mut room = Room::new(RoomIdFactory::generate(), alice, Timestamp::new(1000));
        let bob = Username::new("bob".to_string()).unwrap();
        room.upsert_member(bob, Some(ConnectionId::new()));
        room
    }

    #[test]
    fn test_member_to_dto() {
        // テスト項目: ドメインの Member が DTO に変換される
        // given (前提条件):
        let room = sample_room();
        let alice = Username::new("alice".to_string()).unwrap();
        let member = room.member(&alice).unwrap();

        // when (操作):
        let dto = MemberDto::from(member);

        // then (期待する結果):
        assert_eq!(dto.username, "alice");
        assert!(dto.originator);
        assert!(!dto.connected);
        assert_eq!(dto.score, 0);
    }

    #[test]
    fn test_room_to_summary_dto() {
        // テスト項目: ドメインの Room がサマリ DTO に変換される（メンバーは名前順）
        // given (前提条件):
        let room = sample_room();

        // when (操作):
        let dto = RoomSummaryDto::from(&room);

        // then (期待する結果):
        assert_eq!(dto.room_id, room.id.as_str());
        assert_eq!(dto.members, vec!["alice".to_string(), "bob".to_string()]);
        assert!(dto.created_at.starts_with("1970-01-01T00:00:01"));
    }

    #[test]
    fn test_room_to_detail_dto() {
        // テスト項目: ドメインの Room が詳細 DTO に変換される
        // given (前提条件):
        let room = sample_room();

        // when (操作):
        let dto = RoomDetailDto::from(&room);

        // then (期待する結果):
        assert_eq!(dto.members.len(), 2);
        assert!(dto.members[0].originator);
        assert!(dto.members[1].connected);
    }
}
