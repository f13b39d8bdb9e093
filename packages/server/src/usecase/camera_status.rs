//! UseCase: カメラ状態の変更
//!
//! 送信者のカメラ状態を記録し、他の参加者に直接接続 ID とともに通知します。

use std::sync::Arc;

use crate::domain::{ChannelId, MessagePusher, OutboundEvent, PeerId, RoomId, RoomRepository};

use super::{error::RoomEventError, room_access::lock_joined_room};

pub struct CameraStatusUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl CameraStatusUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        channel_id: &ChannelId,
        room_id: &RoomId,
        peer_id: &PeerId,
        is_enabled: bool,
    ) -> Result<(), RoomEventError> {
        let mut room = lock_joined_room(
            self.rooms.as_ref(),
            self.message_pusher.as_ref(),
            channel_id,
            room_id,
        )
        .await?;

        // 他の参加者の直接接続 ID を名乗ることはできない
        let owner = room.find_by_peer_id(peer_id).map(|p| p.channel_id.clone());
        if owner.as_ref() != Some(channel_id) {
            return Err(RoomEventError::InvalidPayload(
                "peerId does not belong to this connection".to_string(),
            ));
        }
        let participant = room
            .participant_mut(channel_id)
            .ok_or_else(|| RoomEventError::NotInRoom(room_id.clone()))?;
        participant.camera_enabled = is_enabled;
        tracing::debug!(room_id = %room_id, peer_id = %peer_id, is_enabled, "Camera status changed");

        let event = OutboundEvent::RemoteCameraStatusChanged {
            peer_id: peer_id.clone(),
            is_enabled,
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(room.channel_ids_except(channel_id), &event)
            .await
        {
            tracing::warn!(room_id = %room_id, "Failed to broadcast camera status: {}", e);
        }
        Ok(())
    }
}
