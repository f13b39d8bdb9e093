//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    ChatMessage, OutboundEvent, Participant, Point, Room, RoomId, StrokeEvent, StrokeKind,
    ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as dto};
use kaigi_shared::time::timestamp_to_rfc3339;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::StrokeTypeDto> for StrokeKind {
    fn from(kind: dto::StrokeTypeDto) -> Self {
        match kind {
            dto::StrokeTypeDto::Begin => StrokeKind::Begin,
            dto::StrokeTypeDto::Draw => StrokeKind::Draw,
            dto::StrokeTypeDto::End => StrokeKind::End,
        }
    }
}

impl TryFrom<dto::StrokeDto> for StrokeEvent {
    type Error = ValueObjectError;

    fn try_from(dto: dto::StrokeDto) -> Result<Self, Self::Error> {
        let point = match (dto.x, dto.y) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        };
        StrokeEvent::new(dto.kind.into(), point, dto.color, dto.line_width)
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<StrokeKind> for dto::StrokeTypeDto {
    fn from(kind: StrokeKind) -> Self {
        match kind {
            StrokeKind::Begin => dto::StrokeTypeDto::Begin,
            StrokeKind::Draw => dto::StrokeTypeDto::Draw,
            StrokeKind::End => dto::StrokeTypeDto::End,
        }
    }
}

/// Stroke を、所属ルームの ID 付きのワイヤー形式に変換
pub fn stroke_to_dto(room_id: &RoomId, stroke: &StrokeEvent) -> dto::StrokeDto {
    dto::StrokeDto {
        room_id: room_id.as_str().to_string(),
        kind: stroke.kind.into(),
        x: stroke.point.map(|p| p.x),
        y: stroke.point.map(|p| p.y),
        color: stroke.color.clone(),
        line_width: stroke.width,
    }
}

impl From<&Participant> for dto::ParticipantInfo {
    fn from(model: &Participant) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            username: model.display_name.as_str().to_string(),
            color: model.color.to_string(),
            socket_id: model.channel_id.as_str().to_string(),
            peer_connection_id: model.peer_id.as_str().to_string(),
            role: model.role.as_str().to_string(),
            has_whiteboard_control: model.has_whiteboard_control,
            is_camera_enabled: model.camera_enabled,
        }
    }
}

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            username: model.display_name.as_str().to_string(),
            message: model.text.as_str().to_string(),
            color: model.color.to_string(),
            sent_at: model.sent_at.value(),
        }
    }
}

fn participant_infos(participants: &[Participant]) -> Vec<dto::ParticipantInfo> {
    participants.iter().map(dto::ParticipantInfo::from).collect()
}

impl From<&OutboundEvent> for dto::ServerMessage {
    fn from(event: &OutboundEvent) -> Self {
        match event {
            OutboundEvent::Connected { channel_id } => {
                dto::ServerMessage::Connected(dto::ConnectedPayload {
                    socket_id: channel_id.as_str().to_string(),
                })
            }
            OutboundEvent::RoomJoined {
                room_id,
                participants,
            } => dto::ServerMessage::RoomJoined(dto::RoomJoinedPayload {
                room_id: room_id.as_str().to_string(),
                participants: participant_infos(participants),
            }),
            OutboundEvent::JoinRoomError { message, room_id } => {
                dto::ServerMessage::JoinRoomError(dto::JoinRoomErrorPayload {
                    message: message.clone(),
                    room_id: room_id.as_ref().map(|id| id.as_str().to_string()),
                })
            }
            OutboundEvent::UserConnected {
                user_id,
                peer_id,
                display_name,
            } => dto::ServerMessage::UserConnected(dto::UserConnectedPayload {
                user_id: user_id.as_str().to_string(),
                peer_connection_id: peer_id.as_str().to_string(),
                username: display_name.as_str().to_string(),
            }),
            OutboundEvent::UserDisconnected { user_id, peer_id } => {
                dto::ServerMessage::UserDisconnected(dto::UserDisconnectedPayload {
                    user_id: user_id.as_str().to_string(),
                    peer_connection_id: peer_id.as_str().to_string(),
                })
            }
            OutboundEvent::UserList { participants } => {
                dto::ServerMessage::UserList(participant_infos(participants))
            }
            OutboundEvent::Draw { room_id, stroke } => {
                dto::ServerMessage::Draw(stroke_to_dto(room_id, stroke))
            }
            OutboundEvent::CanvasCleared => dto::ServerMessage::CanvasCleared,
            OutboundEvent::WhiteboardHistory { room_id, strokes } => {
                dto::ServerMessage::WhiteboardHistory(
                    strokes.iter().map(|s| stroke_to_dto(room_id, s)).collect(),
                )
            }
            OutboundEvent::CreateMessage(message) => {
                dto::ServerMessage::CreateMessage(message.into())
            }
            OutboundEvent::ChatHistory { messages } => dto::ServerMessage::ChatHistory(
                messages.iter().map(dto::ChatMessageDto::from).collect(),
            ),
            OutboundEvent::WhiteboardPermissionUpdate(update) => {
                dto::ServerMessage::WhiteboardPermissionUpdate(dto::PermissionUpdatePayload {
                    target_socket_id: update.target.as_str().to_string(),
                    has_control: update.has_control,
                })
            }
            OutboundEvent::RemoteCameraStatusChanged {
                peer_id,
                is_enabled,
            } => dto::ServerMessage::RemoteCameraStatusChanged(dto::CameraStatusUpdatePayload {
                peer_id: peer_id.as_str().to_string(),
                is_enabled: *is_enabled,
            }),
            OutboundEvent::EventRejected { event, message } => {
                dto::ServerMessage::Error(dto::ErrorPayload {
                    event: event.clone(),
                    message: message.clone(),
                })
            }
        }
    }
}

impl From<&Participant> for http::ParticipantDetailDto {
    fn from(model: &Participant) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            display_name: model.display_name.as_str().to_string(),
            channel_id: model.channel_id.as_str().to_string(),
            peer_id: model.peer_id.as_str().to_string(),
            role: model.role.as_str().to_string(),
            color: model.color.to_string(),
            has_whiteboard_control: model.has_whiteboard_control,
            camera_enabled: model.camera_enabled,
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
        }
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            participants: room
                .participants()
                .iter()
                .map(|p| p.user_id.as_str().to_string())
                .collect(),
            stroke_count: room.whiteboard().len(),
            message_count: room.chat().len(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            participants: room
                .participants()
                .iter()
                .map(http::ParticipantDetailDto::from)
                .collect(),
            stroke_count: room.whiteboard().len(),
            message_count: room.chat().len(),
            evicted_strokes: room.whiteboard().evicted(),
            evicted_messages: room.chat().evicted(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}
