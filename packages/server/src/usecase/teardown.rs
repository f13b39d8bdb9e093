//! 退出・切断に共通する後片付け
//!
//! 呼び出し元はチャンネルのバインディングを `MessagePusher` から取り出した側だけなので、
//! 退出と切断が競合しても後片付けは一度しか行われません。

use std::sync::Arc;

use crate::domain::{
    ChannelBinding, ChannelId, MessagePusher, OutboundEvent, Participant, RoomRepository,
};

use super::session_registry::SessionRegistry;

pub struct RoomTeardown {
    rooms: Arc<dyn RoomRepository>,
    sessions: Arc<SessionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomTeardown {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        sessions: Arc<SessionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            rooms,
            sessions,
            message_pusher,
        }
    }

    /// 参加者を削除し、残りの参加者に通知し、空になったルームを破棄する
    ///
    /// Session Registry の記録は、まだこのチャンネルを指している場合のみ削除される。
    /// 削除した参加者を返す（参加処理が完了していなかった場合は `None`）。
    pub async fn run(
        &self,
        channel_id: &ChannelId,
        binding: ChannelBinding,
    ) -> Option<Participant> {
        let removed = match self.rooms.lock_room(&binding.room_id).await {
            Ok(mut room) => {
                let removed = room.remove_participant(channel_id);
                if let Some(participant) = &removed {
                    let remaining = room.channel_ids();
                    tracing::info!(
                        room_id = %binding.room_id,
                        channel_id = %channel_id,
                        user_id = %participant.user_id,
                        remaining = remaining.len(),
                        "Participant left"
                    );
                    self.broadcast(
                        remaining.clone(),
                        OutboundEvent::UserDisconnected {
                            user_id: participant.user_id.clone(),
                            peer_id: participant.peer_id.clone(),
                        },
                    )
                    .await;
                    self.broadcast(
                        remaining,
                        OutboundEvent::UserList {
                            participants: room.participants().to_vec(),
                        },
                    )
                    .await;
                }
                self.rooms.close_if_empty(room).await;
                removed
            }
            Err(e) => {
                tracing::debug!(room_id = %binding.room_id, "No room to tear down: {}", e);
                None
            }
        };

        if let Err(e) = self.sessions.unbind(&binding.user_id, channel_id).await {
            tracing::error!(user_id = %binding.user_id, "Failed to clear session: {}", e);
        }

        removed
    }

    async fn broadcast(&self, targets: Vec<ChannelId>, event: OutboundEvent) {
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!(event = event.name(), "Failed to broadcast: {}", e);
        }
    }
}
