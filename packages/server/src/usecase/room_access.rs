//! 参加後のイベント処理に共通するルームの取得

use crate::domain::{ChannelId, MessagePusher, RoomGuard, RoomId, RoomRepository};

use super::error::RoomEventError;

/// 送信者が参加済みのルームをロックして返す
///
/// チャンネルが `room_id` に参加していない（参加処理中を含む）場合は `NotInRoom`。
pub(crate) async fn lock_joined_room(
    rooms: &dyn RoomRepository,
    message_pusher: &dyn MessagePusher,
    channel_id: &ChannelId,
    room_id: &RoomId,
) -> Result<RoomGuard, RoomEventError> {
    let not_in_room = || RoomEventError::NotInRoom(room_id.clone());

    match message_pusher.binding(channel_id).await {
        Some(binding) if &binding.room_id == room_id => {}
        _ => return Err(not_in_room()),
    }

    let room = rooms
        .lock_room(room_id)
        .await
        .map_err(|_| not_in_room())?;
    if room.participant(channel_id).is_none() {
        return Err(not_in_room());
    }
    Ok(room)
}
