//! UseCase layer
//!
//! Room Lifecycle Manager の各操作（参加・退出・切断・描画・チャット・権限・カメラ）と
//! Session Registry、読み取り系のルーム参照を提供します。

pub mod camera_status;
pub mod clear_canvas;
pub mod disconnect_participant;
pub mod draw_stroke;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
mod room_access;
pub mod send_message;
pub mod session_registry;
pub mod set_whiteboard_permission;
pub mod teardown;

#[cfg(test)]
pub(crate) mod test_support;

pub use camera_status::CameraStatusUseCase;
pub use clear_canvas::ClearCanvasUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use draw_stroke::DrawStrokeUseCase;
pub use error::{GetRoomDetailError, JoinError, LeaveError, RoomEventError, SessionError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRequest, JoinRoomUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use send_message::SendMessageUseCase;
pub use session_registry::SessionRegistry;
pub use set_whiteboard_permission::SetWhiteboardPermissionUseCase;
pub use teardown::RoomTeardown;
