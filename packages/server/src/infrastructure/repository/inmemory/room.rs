//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! ルームごとに `Mutex` を持ち、異なるルームのイベントは互いにブロックしません。
//!
//! ## ルームの破棄
//!
//! 破棄はルームのロックを保持したまま `closed` を立ててから Map から取り除きます。
//! 取り除かれる前に古いハンドルを掴んでいた処理は、ロック取得後に `closed` を見て
//! 新しいルームを取り直します。

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    HistoryLimits, RepositoryError, Room, RoomGuard, RoomId, RoomRepository, Timestamp,
};
use kaigi_shared::time::Clock;

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
    clock: Arc<dyn Clock>,
    limits: HistoryLimits,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(clock: Arc<dyn Clock>, limits: HistoryLimits) -> Self {
        Self {
            rooms: DashMap::new(),
            clock,
            limits,
        }
    }

    /// 現在保持しているルーム数
    #[cfg(test)]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    fn handle_or_create(&self, room_id: &RoomId) -> Arc<Mutex<Room>> {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!(room_id = %room_id, "Room created");
                Arc::new(Mutex::new(Room::new(
                    room_id.clone(),
                    Timestamp::new(self.clock.now_millis()),
                    self.limits,
                )))
            })
            .value()
            .clone()
    }

    fn evict(&self, room_id: &RoomId, handle: &Arc<Mutex<Room>>) {
        self.rooms
            .remove_if(room_id, |_, current| Arc::ptr_eq(current, handle));
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn open_room(&self, room_id: &RoomId) -> Result<RoomGuard, RepositoryError> {
        loop {
            let handle = self.handle_or_create(room_id);
            let guard = handle.clone().lock_owned().await;
            if !guard.is_closed() {
                return Ok(guard);
            }
            drop(guard);
            self.evict(room_id, &handle);
        }
    }

    async fn lock_room(&self, room_id: &RoomId) -> Result<RoomGuard, RepositoryError> {
        let handle = self
            .handle(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.clone()))?;
        let guard = handle.lock_owned().await;
        if guard.is_closed() {
            return Err(RepositoryError::RoomNotFound(room_id.clone()));
        }
        Ok(guard)
    }

    async fn close_if_empty(&self, mut guard: RoomGuard) -> bool {
        if !guard.is_empty() {
            return false;
        }
        guard.close();
        let handle = OwnedMutexGuard::mutex(&guard).clone();
        let room_id = guard.id.clone();
        let discarded_strokes = guard.whiteboard().len();
        let discarded_messages = guard.chat().len();
        drop(guard);

        self.evict(&room_id, &handle);
        tracing::info!(
            room_id = %room_id,
            discarded_strokes,
            discarded_messages,
            "Room closed"
        );
        true
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let guard = self.lock_room(room_id).await?;
        Ok(guard.clone())
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let handles: Vec<Arc<Mutex<Room>>> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            if !room.is_closed() {
                rooms.push(room.clone());
            }
        }
        rooms.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        rooms
    }
}
