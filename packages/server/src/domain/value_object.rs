//! ドメイン層の値オブジェクト
//!
//! 文字列をそのまま受け渡さず、検証済みの newtype として扱います。
//! 検証は UI 層（DTO 境界）で行い、ドメイン層の内側では常に妥当な値のみが流れます。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

/// ルーム ID（不透明な一意識別子）
///
/// 生成は [`RoomIdFactory`] が行う。ルーム作成後に変わることはない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// ルーム ID の最大長
    pub const MAX_LENGTH: usize = 32;

    /// 検証付きで RoomId を作成
    pub fn new(value: String) -> Result<Self, DomainError> {
        let valid_chars = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if value.is_empty() || value.len() > Self::MAX_LENGTH || !valid_chars {
            return Err(DomainError::InvalidRoomId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// RoomId のファクトリ
///
/// UUID v4 のエントロピーから短い base36 コードを生成する。
/// 衝突の可能性は無視できるほど小さいが、最終的な一意性の保証は
/// Room Store 側の check-and-insert が行う（衝突時は再生成）。
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// 生成されるルームコードの長さ
    pub const CODE_LENGTH: usize = 6;

    /// 新しいルーム ID を生成
    pub fn generate() -> RoomId {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut seed = Uuid::new_v4().as_u128();
        let mut code = String::with_capacity(Self::CODE_LENGTH);
        for _ in 0..Self::CODE_LENGTH {
            code.push(ALPHABET[(seed % ALPHABET.len() as u128) as usize] as char);
            seed /= ALPHABET.len() as u128;
        }
        // ALPHABET のみで構成されるため検証は常に成功する
        RoomId(code)
    }
}

/// ユーザー名（ルーム内で一意な表示名）
///
/// グローバルには一意ではない。ミラーのファイルパスにも使われるため、
/// パス区切りなどの危険な文字は許可しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// ユーザー名の最大長
    pub const MAX_LENGTH: usize = 32;

    /// 検証付きで Username を作成
    pub fn new(value: String) -> Result<Self, DomainError> {
        let valid_chars = value
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if value.is_empty() || value.chars().count() > Self::MAX_LENGTH || !valid_chars {
            return Err(DomainError::InvalidUsername(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 接続 ID
///
/// WebSocket 接続ごとにサーバ側で採番される。クライアントは関与しない。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい接続 ID を採番
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// チャットメッセージの内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    /// メッセージの最大長（文字数）
    pub const MAX_LENGTH: usize = 2000;

    /// 検証付きで MessageContent を作成
    pub fn new(value: String) -> Result<Self, DomainError> {
        let length = value.chars().count();
        if value.is_empty() || length > Self::MAX_LENGTH {
            return Err(DomainError::InvalidMessageContent { length });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒、UTC）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_factory_generates_valid_code() {
        // テスト項目: 生成されたルーム ID が所定の長さ・文字種である
        // given (前提条件):

        // when (操作):
        let room_id = RoomIdFactory::generate();

        // then (期待する結果):
        assert_eq!(room_id.as_str().len(), RoomIdFactory::CODE_LENGTH);
        assert!(
            room_id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_room_id_factory_generates_distinct_codes() {
        // テスト項目: 連続生成したルーム ID が互いに異なる
        // given (前提条件):

        // when (操作):
        let ids: Vec<RoomId> = (0..100).map(|_| RoomIdFactory::generate()).collect();

        // then (期待する結果): 100 件程度で衝突しない
        let unique: std::collections::HashSet<&str> =
            ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_room_id_rejects_empty_and_invalid_chars() {
        // テスト項目: 空文字やパス区切りを含むルーム ID が拒否される
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert!(RoomId::new(String::new()).is_err());
        assert!(RoomId::new("abc/def".to_string()).is_err());
        assert!(RoomId::new("a".repeat(RoomId::MAX_LENGTH + 1)).is_err());
        assert!(RoomId::new("abc123".to_string()).is_ok());
    }

    #[test]
    fn test_username_validation() {
        // テスト項目: ユーザー名の検証（空・危険な文字・長さ超過の拒否）
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert!(Username::new("alice".to_string()).is_ok());
        assert!(Username::new("alice_01".to_string()).is_ok());
        assert!(Username::new(String::new()).is_err());
        assert!(Username::new("../etc".to_string()).is_err());
        assert!(Username::new("a b".to_string()).is_err());
        assert!(Username::new("a".repeat(Username::MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_message_content_validation() {
        // テスト項目: メッセージ内容の検証（空・長さ超過の拒否）
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert!(MessageContent::new("hello".to_string()).is_ok());
        assert!(MessageContent::new(String::new()).is_err());
        assert!(MessageContent::new("x".repeat(MessageContent::MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_connection_id_is_unique() {
        // テスト項目: 接続 ID が採番ごとに異なる
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        // then (期待する結果):
        assert_ne!(a, b);
    }
}
