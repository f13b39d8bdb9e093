//! MessagePusher trait 定義
//!
//! クライアントへの通知手段を抽象化します。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::MessagePushError,
    event::OutboundEvent,
    value_object::{ChannelId, RoomId, UserId},
};

/// 1 接続分の送信キュー（シリアライズ済みのフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// チャンネルが参加中（または参加処理中）のルームとアイデンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    pub room_id: RoomId,
    pub user_id: UserId,
}

/// MessagePusher trait
///
/// 接続中のチャンネルの一覧を管理し、チャンネル生存確認の唯一の情報源になる。
/// チャンネルごとのバインディングは、退出と切断のどちらか先に取り出した方だけが
/// 後片付けを行うために使う。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, channel_id: ChannelId, sender: PusherChannel);

    /// 接続を登録解除し、残っていたバインディングを返す
    async fn unregister_client(&self, channel_id: &ChannelId) -> Option<ChannelBinding>;

    /// チャンネルがまだ接続中か
    async fn is_connected(&self, channel_id: &ChannelId) -> bool;

    /// チャンネルにルームを割り当てる
    ///
    /// 未接続なら `ClientNotFound`、既に割り当て済みなら `AlreadyBound` を返す。
    async fn bind(
        &self,
        channel_id: &ChannelId,
        binding: ChannelBinding,
    ) -> Result<(), MessagePushError>;

    /// 現在のバインディングを参照
    async fn binding(&self, channel_id: &ChannelId) -> Option<ChannelBinding>;

    /// バインディングを取り出す（接続は維持される）
    async fn take_binding(&self, channel_id: &ChannelId) -> Option<ChannelBinding>;

    /// 特定のチャンネルに送信
    async fn push_to(
        &self,
        channel_id: &ChannelId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数のチャンネルに送信（一部の失敗は許容される）
    async fn broadcast(
        &self,
        targets: Vec<ChannelId>,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;
}
