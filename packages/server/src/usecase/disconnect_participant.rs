//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時の後片付け（参加者削除、通知、空ルームの破棄、Session Registry の解除）
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加中の切断
//! - エッジケース：最後の参加者の切断（ルームと履歴の破棄）
//! - エッジケース：退出済み・未参加のチャンネルの切断
//! - 競合：退出と切断の同時発生、参加処理中の切断

use std::sync::Arc;

use crate::domain::{ChannelId, MessagePusher, Participant};

use super::teardown::RoomTeardown;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// MessagePusher（接続の登録解除とバインディングの取り出し）
    message_pusher: Arc<dyn MessagePusher>,
    teardown: Arc<RoomTeardown>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>, teardown: Arc<RoomTeardown>) -> Self {
        Self {
            message_pusher,
            teardown,
        }
    }

    /// 切断を実行
    ///
    /// 冪等。ルームに参加していなかった場合は接続の登録解除のみを行い `None` を返す。
    pub async fn execute(&self, channel_id: &ChannelId) -> Option<Participant> {
        let binding = self.message_pusher.unregister_client(channel_id).await?;
        tracing::debug!(
            channel_id = %channel_id,
            room_id = %binding.room_id,
            "Tearing down after disconnect"
        );
        self.teardown.run(channel_id, binding).await
    }
}
