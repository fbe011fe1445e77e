//! UseCase 層
//!
//! 受信イベント 1 種につき 1 つのユースケースが、Room Store と
//! Connection Registry への複合変更をルーム単位で直列化して実行します。
//! Room Store / Connection Registry への変更はすべてこの層を経由します。

mod broadcast;
mod create_room;
mod error;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod leave_room;
mod room_locks;
mod send_message;

pub use broadcast::RoomBroadcaster;
pub use create_room::{CreateRoomOutcome, CreateRoomUseCase};
pub use error::{GetRoomDetailError, JoinRoomError, LeaveRoomError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRoomOutcome, JoinRoomUseCase};
pub use leave_room::{Departure, LeaveRoomUseCase};
pub use room_locks::RoomLocks;
pub use send_message::SendMessageUseCase;
