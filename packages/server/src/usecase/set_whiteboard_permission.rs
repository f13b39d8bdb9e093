//! UseCase: ホワイトボード描画権限の変更
//!
//! 特権ロールの参加者のみが実行できます。権限の状態遷移は Permission Arbiter
//! （`domain::permission::arbitrate`）に委譲し、返された更新を順番にルーム全体へ通知します。

use std::sync::Arc;

use crate::domain::{
    ChannelId, ControlUpdate, DomainError, MessagePusher, OutboundEvent, RoomId, RoomRepository,
    arbitrate,
};

use super::{error::RoomEventError, room_access::lock_joined_room};

pub struct SetWhiteboardPermissionUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SetWhiteboardPermissionUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    /// 権限変更を実行し、通知した更新を順番に返す
    pub async fn execute(
        &self,
        requester: &ChannelId,
        room_id: &RoomId,
        target: &ChannelId,
        has_control: bool,
    ) -> Result<Vec<ControlUpdate>, RoomEventError> {
        let mut room = lock_joined_room(
            self.rooms.as_ref(),
            self.message_pusher.as_ref(),
            requester,
            room_id,
        )
        .await?;

        let authorized = room
            .participant(requester)
            .is_some_and(|p| p.role.is_elevated());
        if !authorized {
            tracing::warn!(
                room_id = %room_id,
                channel_id = %requester,
                target = %target,
                "Permission change rejected: requester is not elevated"
            );
            return Err(RoomEventError::NotAuthorized);
        }

        let updates = arbitrate(&mut room, target, has_control).map_err(|e| match e {
            DomainError::ParticipantNotFound(channel) => RoomEventError::UnknownTarget(channel),
            other => RoomEventError::InvalidPayload(other.to_string()),
        })?;

        tracing::info!(
            room_id = %room_id,
            target = %target,
            has_control,
            updates = updates.len(),
            "Whiteboard control changed"
        );

        let everyone = room.channel_ids();
        for update in &updates {
            let event = OutboundEvent::WhiteboardPermissionUpdate(update.clone());
            if let Err(e) = self
                .message_pusher
                .broadcast(everyone.clone(), &event)
                .await
            {
                tracing::warn!(room_id = %room_id, "Failed to broadcast permission update: {}", e);
            }
        }
        Ok(updates)
    }
}
