//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 送信者の表示名と色を付けたメッセージの履歴追加と、ルーム全体へのブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト（送信者を含む）
//! - 異常系：参加していないルームへの送信
//! - エッジケース：履歴の上限を超えた場合の古いメッセージの破棄

use std::sync::Arc;

use crate::domain::{
    ChannelId, ChatMessage, MessagePusher, MessageText, OutboundEvent, RoomId, RoomRepository,
    Timestamp,
};
use kaigi_shared::time::Clock;

use super::{error::RoomEventError, room_access::lock_joined_room};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    rooms: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            message_pusher,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 履歴に追加されたメッセージ
    /// * `Err(RoomEventError)` - 送信者がルームに参加していない
    pub async fn execute(
        &self,
        channel_id: &ChannelId,
        room_id: &RoomId,
        text: MessageText,
    ) -> Result<ChatMessage, RoomEventError> {
        let mut room = lock_joined_room(
            self.rooms.as_ref(),
            self.message_pusher.as_ref(),
            channel_id,
            room_id,
        )
        .await?;

        let sender = room
            .participant(channel_id)
            .ok_or_else(|| RoomEventError::NotInRoom(room_id.clone()))?;
        let message = ChatMessage {
            display_name: sender.display_name.clone(),
            text,
            color: sender.color,
            sent_at: Timestamp::new(self.clock.now_millis()),
        };

        if room.chat_mut().append(message.clone()) {
            tracing::debug!(
                room_id = %room_id,
                evicted = room.chat().evicted(),
                "Chat history full, evicted oldest message"
            );
        }

        let event = OutboundEvent::CreateMessage(message.clone());
        if let Err(e) = self
            .message_pusher
            .broadcast(room.channel_ids(), &event)
            .await
        {
            tracing::warn!(room_id = %room_id, "Failed to broadcast message: {}", e);
        }
        Ok(message)
    }
}
