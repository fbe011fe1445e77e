//! Formatting of incoming server events for terminal display.

use chrono::Local;
use tamariba_server::infrastructure::dto::websocket::MemberDto;

/// Formats server events into printable lines.
pub struct MessageFormatter;

impl MessageFormatter {
    fn clock() -> String {
        Local::now().format("%H:%M:%S").to_string()
    }

    /// Format the confirmation that a room was created.
    pub fn format_room_created(room_id: &str) -> String {
        format!("\n[{}] Created room '{}'. Share this id to invite others.\n", Self::clock(), room_id)
    }

    /// Format the member list received on a successful join.
    pub fn format_join_success(room_id: &str, members: &[MemberDto]) -> String {
        let mut out = format!("\n[{}] Joined room '{}'. Members:\n", Self::clock(), room_id);
        out.push_str(&Self::member_lines(members));
        out
    }

    /// Format a user-joined notification.
    pub fn format_user_joined(username: &str) -> String {
        format!("\n[{}] * {} joined the room\n", Self::clock(), username)
    }

    /// Format a user-left notification.
    pub fn format_user_left(username: &str) -> String {
        format!("\n[{}] * {} left the room\n", Self::clock(), username)
    }

    /// Format an incoming chat message.
    pub fn format_chat_message(username: &str, text: &str) -> String {
        format!("\n[{}] {}: {}\n", Self::clock(), username, text)
    }

    /// Format a room membership update.
    pub fn format_room_details(room_id: &str, members: &[MemberDto]) -> String {
        let mut out = format!("\n[{}] Room '{}' members:\n", Self::clock(), room_id);
        out.push_str(&Self::member_lines(members));
        out
    }

    /// Format an error reported by the server.
    pub fn format_error(message: &str) -> String {
        format!("\n[{}] ! {}\n", Self::clock(), message)
    }

    /// Format a message that could not be parsed as a known event.
    pub fn format_raw_message(text: &str) -> String {
        format!("\n[{}] ? {}\n", Self::clock(), text)
    }

    fn member_lines(members: &[MemberDto]) -> String {
        let mut out = String::new();
        for member in members {
            let marker = if member.originator { "*" } else { "-" };
            let presence = if member.connected { "" } else { " (offline)" };
            out.push_str(&format!("  {} {}{}\n", marker, member.username, presence));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, originator: bool, connected: bool) -> MemberDto {
        MemberDto {
            username: name.to_string(),
            originator,
            connected,
            score: 0,
            answer_order: None,
            active: true,
        }
    }

    #[test]
    fn test_format_user_joined_contains_username() {
        // テスト項目: 参加通知にユーザー名が含まれる
        // given (前提条件):

        // when (操作):
        let formatted = MessageFormatter::format_user_joined("bob");

        // then (期待する結果):
        assert!(formatted.contains("bob joined the room"));
    }

    #[test]
    fn test_format_chat_message_contains_sender_and_text() {
        // テスト項目: チャット表示に送信者と本文が含まれる
        // given (前提条件):

        // when (操作):
        let formatted = MessageFormatter::format_chat_message("alice", "hello");

        // then (期待する結果):
        assert!(formatted.contains("alice: hello"));
    }

    #[test]
    fn test_format_join_success_marks_originator() {
        // テスト項目: メンバー一覧で Originator に印が付き、未接続が表示される
        // given (前提条件):
        let members = vec![member("alice", true, true), member("bob", false, false)];

        // when (操作):
        let formatted = MessageFormatter::format_join_success("abc123", &members);

        // then (期待する結果):
        assert!(formatted.contains("Joined room 'abc123'"));
        assert!(formatted.contains("* alice"));
        assert!(formatted.contains("- bob (offline)"));
    }
}
