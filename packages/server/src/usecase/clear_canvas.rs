//! UseCase: ホワイトボードの消去
//!
//! ストローク履歴を全て破棄し、ルーム全体（送信者を含む）に消去を通知します。

use std::sync::Arc;

use crate::domain::{ChannelId, MessagePusher, OutboundEvent, RoomId, RoomRepository};

use super::{error::RoomEventError, room_access::lock_joined_room};

pub struct ClearCanvasUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ClearCanvasUseCase {
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
    ) -> Result<(), RoomEventError> {
        let mut room = lock_joined_room(
            self.rooms.as_ref(),
            self.message_pusher.as_ref(),
            channel_id,
            room_id,
        )
        .await?;

        let has_control = room
            .participant(channel_id)
            .is_some_and(|p| p.has_whiteboard_control);
        if !has_control {
            return Err(RoomEventError::NoWhiteboardControl);
        }

        let cleared = room.whiteboard().len();
        room.whiteboard_mut().clear();
        tracing::info!(room_id = %room_id, channel_id = %channel_id, cleared, "Canvas cleared");

        if let Err(e) = self
            .message_pusher
            .broadcast(room.channel_ids(), &OutboundEvent::CanvasCleared)
            .await
        {
            tracing::warn!(room_id = %room_id, "Failed to broadcast canvas-cleared: {}", e);
        }
        Ok(())
    }
}
