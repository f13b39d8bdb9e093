//! HTTP API response DTOs.

use serde::Serialize;

/// Room summary for `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub participants: Vec<String>,
    pub stroke_count: usize,
    pub message_count: usize,
    pub created_at: String,
}

/// Participant entry of `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantDetailDto {
    pub user_id: String,
    pub display_name: String,
    pub channel_id: String,
    pub peer_id: String,
    pub role: String,
    pub color: String,
    pub has_whiteboard_control: bool,
    pub camera_enabled: bool,
    pub joined_at: String,
}

/// Room detail for `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub participants: Vec<ParticipantDetailDto>,
    pub stroke_count: usize,
    pub message_count: usize,
    pub evicted_strokes: u64,
    pub evicted_messages: u64,
    pub created_at: String,
}
