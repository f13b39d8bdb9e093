//! Session Registry
//!
//! アイデンティティごとに、参加中のルームとチャンネルの組を高々 1 つ保持します。
//!
//! ## 排他制御
//!
//! 読み込み → 判定 → 書き込みの間、同じアイデンティティの処理はキー単位のロックで
//! 直列化されます。別のアイデンティティ（別のルーム）の処理はブロックされません。
//! ロックは待機者がいなくなった時点で Map から取り除かれます。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::{
    ChannelId, MessagePusher, RoomId, SessionRecord, SessionStore, Timestamp, UserId,
};
use kaigi_shared::time::Clock;

use super::error::SessionError;

pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    /// チャンネルの生存確認に使用
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SessionStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            message_pusher,
            clock,
            locks: DashMap::new(),
        }
    }

    /// アイデンティティをルームとチャンネルにバインドする
    ///
    /// 接続中の別チャンネルを指す記録があれば `Conflict` を返す。
    /// 記録のチャンネルが既に切断されていれば（stale）、黙って上書きする。
    pub async fn bind(
        &self,
        user_id: &UserId,
        room_id: &RoomId,
        channel_id: &ChannelId,
    ) -> Result<(), SessionError> {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.bind_locked(user_id, room_id, channel_id).await
        };
        drop(lock);
        self.release(user_id);
        result
    }

    /// バインドを解除する
    ///
    /// 記録が別のチャンネルを指している場合は何もしない（`false` を返す）。
    pub async fn unbind(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> Result<bool, SessionError> {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.unbind_locked(user_id, channel_id).await
        };
        drop(lock);
        self.release(user_id);
        result
    }

    /// チャンネルが既に切断されているか
    pub async fn is_stale(&self, channel_id: &ChannelId) -> bool {
        !self.message_pusher.is_connected(channel_id).await
    }

    /// 現在の記録を取得
    pub async fn current(&self, user_id: &UserId) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self.store.load(user_id).await?)
    }

    async fn bind_locked(
        &self,
        user_id: &UserId,
        room_id: &RoomId,
        channel_id: &ChannelId,
    ) -> Result<(), SessionError> {
        if let Some(existing) = self.store.load(user_id).await? {
            if &existing.channel_id != channel_id {
                if !self.is_stale(&existing.channel_id).await {
                    tracing::warn!(
                        user_id = %user_id,
                        room_id = %room_id,
                        bound_room_id = %existing.room_id,
                        "Join rejected: identity is bound to a live channel"
                    );
                    return Err(SessionError::Conflict(existing.room_id));
                }
                tracing::info!(
                    user_id = %user_id,
                    stale_channel_id = %existing.channel_id,
                    stale_room_id = %existing.room_id,
                    "Superseding stale session"
                );
            }
        }

        let record = SessionRecord {
            room_id: room_id.clone(),
            channel_id: channel_id.clone(),
            bound_at: Timestamp::new(self.clock.now_millis()),
        };
        self.store.save(user_id, record).await?;
        tracing::debug!(user_id = %user_id, room_id = %room_id, channel_id = %channel_id, "Session bound");
        Ok(())
    }

    async fn unbind_locked(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> Result<bool, SessionError> {
        match self.store.load(user_id).await? {
            Some(record) if &record.channel_id == channel_id => {
                self.store.clear(user_id).await?;
                tracing::debug!(user_id = %user_id, channel_id = %channel_id, "Session unbound");
                Ok(true)
            }
            Some(record) => {
                tracing::debug!(
                    user_id = %user_id,
                    channel_id = %channel_id,
                    bound_channel_id = %record.channel_id,
                    "Unbind ignored: session belongs to another channel"
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn lock_for(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn release(&self, user_id: &UserId) {
        self.locks
            .remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
