//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

pub struct GetRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// 現在存在する全ルームのスナップショット（作成順）
    pub async fn execute(&self) -> Vec<Room> {
        self.rooms.list_rooms().await
    }
}
