//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ChannelId, RepositoryError, RoomId};

/// Session Registry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 接続中の別チャンネルが既にバインドされている
    #[error("already in a meeting in room {0}")]
    Conflict(RoomId),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// 参加処理のエラー（参加者本人にのみ通知される）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("invalid join request: {0}")]
    InvalidRequest(String),
    #[error("user id does not match the authenticated identity")]
    IdentityMismatch,
    #[error("this connection has already joined room {0}")]
    ChannelAlreadyJoined(RoomId),
    #[error("you are already in a meeting in room {0}")]
    AlreadyInMeeting(RoomId),
    #[error("connection closed before the join completed")]
    ChannelClosed,
    #[error("could not determine your role: {0}")]
    RoleLookupFailed(String),
    #[error("room state unavailable: {0}")]
    Repository(String),
}

impl JoinError {
    /// クライアントが再開先として提示できるルーム
    pub fn conflicting_room(&self) -> Option<&RoomId> {
        match self {
            JoinError::AlreadyInMeeting(room_id) | JoinError::ChannelAlreadyJoined(room_id) => {
                Some(room_id)
            }
            _ => None,
        }
    }
}

/// 退出処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    #[error("not in room {0}")]
    NotInRoom(RoomId),
}

/// 参加後のルームイベント（描画・チャット・権限・カメラ）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomEventError {
    #[error("not in room {0}")]
    NotInRoom(RoomId),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("only an elevated participant may change whiteboard control")]
    NotAuthorized,
    #[error("whiteboard control is required")]
    NoWhiteboardControl,
    #[error("unknown permission target: {0}")]
    UnknownTarget(ChannelId),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
    #[error("repository error")]
    RepositoryError,
}
