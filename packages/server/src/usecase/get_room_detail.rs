//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{RepositoryError, Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

pub struct GetRoomDetailUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// 指定したルームのスナップショットを取得
    pub async fn execute(&self, room_id: String) -> Result<Room, GetRoomDetailError> {
        let room_id = RoomId::new(room_id).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        self.rooms.get_room(&room_id).await.map_err(|e| match e {
            RepositoryError::RoomNotFound(_) => GetRoomDetailError::RoomNotFound,
            RepositoryError::Unavailable(_) => GetRoomDetailError::RepositoryError,
        })
    }
}
