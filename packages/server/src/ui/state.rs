//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::MessagePusher,
    usecase::{
        CameraStatusUseCase, ClearCanvasUseCase, DisconnectParticipantUseCase, DrawStrokeUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        SendMessageUseCase, SetWhiteboardPermissionUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// MessagePusher（チャンネルの登録と送信）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub draw_stroke_usecase: Arc<DrawStrokeUseCase>,
    pub clear_canvas_usecase: Arc<ClearCanvasUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub set_whiteboard_permission_usecase: Arc<SetWhiteboardPermissionUseCase>,
    pub camera_status_usecase: Arc<CameraStatusUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// Reject upgrades without an upstream identity header
    pub require_identity_header: bool,
}
