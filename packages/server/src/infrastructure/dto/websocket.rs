//! WebSocket message DTOs.
//!
//! Every frame is a JSON object `{ "event": <name>, "data": <payload> }`.
//! Payload fields are camelCase.

use serde::{Deserialize, Serialize};

// ========================================
// Client → Server
// ========================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "join-room")]
    JoinRoom(JoinRoomPayload),
    #[serde(rename = "leave-room")]
    LeaveRoom(LeaveRoomPayload),
    #[serde(rename = "draw")]
    Draw(StrokeDto),
    #[serde(rename = "clear-canvas")]
    ClearCanvas(RoomPayload),
    #[serde(rename = "message")]
    Message(ChatSendPayload),
    #[serde(rename = "signal:set-whiteboard-permission")]
    SetWhiteboardPermission(SetPermissionPayload),
    #[serde(rename = "camera-status-changed")]
    CameraStatusChanged(CameraStatusPayload),
}

impl ClientMessage {
    /// Event name as it appears on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom(_) => "join-room",
            ClientMessage::LeaveRoom(_) => "leave-room",
            ClientMessage::Draw(_) => "draw",
            ClientMessage::ClearCanvas(_) => "clear-canvas",
            ClientMessage::Message(_) => "message",
            ClientMessage::SetWhiteboardPermission(_) => "signal:set-whiteboard-permission",
            ClientMessage::CameraStatusChanged(_) => "camera-status-changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub user_id: String,
    pub peer_connection_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomPayload {
    pub room_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendPayload {
    pub room_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPermissionPayload {
    pub room_id: String,
    pub target_socket_id: String,
    pub has_control: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatusPayload {
    pub room_id: String,
    pub peer_id: String,
    pub is_enabled: bool,
}

/// Stroke kind on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTypeDto {
    Begin,
    Draw,
    End,
}

/// Stroke payload, used both inbound and outbound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeDto {
    pub room_id: String,
    #[serde(rename = "type")]
    pub kind: StrokeTypeDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected(ConnectedPayload),
    #[serde(rename = "room-joined")]
    RoomJoined(RoomJoinedPayload),
    #[serde(rename = "join-room-error")]
    JoinRoomError(JoinRoomErrorPayload),
    #[serde(rename = "user-connected")]
    UserConnected(UserConnectedPayload),
    #[serde(rename = "user-disconnected")]
    UserDisconnected(UserDisconnectedPayload),
    #[serde(rename = "user-list")]
    UserList(Vec<ParticipantInfo>),
    #[serde(rename = "draw")]
    Draw(StrokeDto),
    #[serde(rename = "canvas-cleared")]
    CanvasCleared,
    #[serde(rename = "whiteboard-history")]
    WhiteboardHistory(Vec<StrokeDto>),
    #[serde(rename = "createMessage")]
    CreateMessage(ChatMessageDto),
    #[serde(rename = "chat-history")]
    ChatHistory(Vec<ChatMessageDto>),
    #[serde(rename = "signal:whiteboard-permission-update")]
    WhiteboardPermissionUpdate(PermissionUpdatePayload),
    #[serde(rename = "remote-camera-status-changed")]
    RemoteCameraStatusChanged(CameraStatusUpdatePayload),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub socket_id: String,
}

/// One entry of a participant list snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: String,
    pub username: String,
    pub color: String,
    pub socket_id: String,
    pub peer_connection_id: String,
    pub role: String,
    pub has_whiteboard_control: bool,
    pub is_camera_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedPayload {
    pub room_id: String,
    pub participants: Vec<ParticipantInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConnectedPayload {
    pub user_id: String,
    pub peer_connection_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDisconnectedPayload {
    pub user_id: String,
    pub peer_connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub username: String,
    pub message: String,
    pub color: String,
    pub sent_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionUpdatePayload {
    pub target_socket_id: String,
    pub has_control: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatusUpdatePayload {
    pub peer_id: String,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub event: String,
    pub message: String,
}
