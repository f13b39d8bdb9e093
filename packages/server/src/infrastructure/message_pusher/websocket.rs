//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` とルームへのバインディングを管理
//! - `OutboundEvent` をワイヤー形式（JSON）に変換して送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 送信はキューへの投入のみで完了するため、ルームのロックを保持したまま呼び出せます。

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    domain::{
        ChannelBinding, ChannelId, MessagePushError, MessagePusher, OutboundEvent, PusherChannel,
    },
    infrastructure::dto::websocket::ServerMessage,
};

struct ClientEntry {
    sender: PusherChannel,
    binding: Option<ChannelBinding>,
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(channel_id.clone(), tx).await;
/// pusher.push_to(&channel_id, &OutboundEvent::CanvasCleared).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: channel_id
    clients: DashMap<ChannelId, ClientEntry>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続中のチャンネル数
    #[cfg(test)]
    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    fn encode(event: &OutboundEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerMessage::from(event))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, channel_id: ChannelId, sender: PusherChannel) {
        tracing::debug!(channel_id = %channel_id, "Channel registered to MessagePusher");
        self.clients.insert(
            channel_id,
            ClientEntry {
                sender,
                binding: None,
            },
        );
    }

    async fn unregister_client(&self, channel_id: &ChannelId) -> Option<ChannelBinding> {
        let (_, entry) = self.clients.remove(channel_id)?;
        tracing::debug!(channel_id = %channel_id, "Channel unregistered from MessagePusher");
        entry.binding
    }

    async fn is_connected(&self, channel_id: &ChannelId) -> bool {
        self.clients
            .get(channel_id)
            .is_some_and(|entry| !entry.sender.is_closed())
    }

    async fn bind(
        &self,
        channel_id: &ChannelId,
        binding: ChannelBinding,
    ) -> Result<(), MessagePushError> {
        match self.clients.entry(channel_id.clone()) {
            Entry::Vacant(_) => Err(MessagePushError::ClientNotFound(
                channel_id.as_str().to_string(),
            )),
            Entry::Occupied(mut entry) => {
                let entry = entry.get_mut();
                if entry.binding.is_some() {
                    return Err(MessagePushError::AlreadyBound(
                        channel_id.as_str().to_string(),
                    ));
                }
                entry.binding = Some(binding);
                Ok(())
            }
        }
    }

    async fn binding(&self, channel_id: &ChannelId) -> Option<ChannelBinding> {
        self.clients
            .get(channel_id)
            .and_then(|entry| entry.binding.clone())
    }

    async fn take_binding(&self, channel_id: &ChannelId) -> Option<ChannelBinding> {
        self.clients
            .get_mut(channel_id)
            .and_then(|mut entry| entry.binding.take())
    }

    async fn push_to(
        &self,
        channel_id: &ChannelId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(event)?;
        let entry = self
            .clients
            .get(channel_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(channel_id.as_str().to_string()))?;

        entry
            .sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!(channel_id = %channel_id, event = event.name(), "Pushed event");
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ChannelId>,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let frame = Self::encode(event)?;

        for target in targets {
            match self.clients.get(&target) {
                Some(entry) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    if let Err(e) = entry.sender.send(frame.clone()) {
                        tracing::warn!(
                            channel_id = %target,
                            event = event.name(),
                            "Failed to push event: {}",
                            e
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        channel_id = %target,
                        event = event.name(),
                        "Channel not found during broadcast, skipping"
                    );
                }
            }
        }
        tracing::debug!(event = event.name(), "Broadcasted event");

        Ok(())
    }
}
