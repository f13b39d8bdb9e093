//! ドメイン層のエラー定義

use thiserror::Error;

use super::value_object::{ChannelId, RoomId};

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} is too long ({actual} > {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("invalid stroke: {0}")]
    InvalidStroke(&'static str),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// エンティティの不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("channel {0} is already a participant of this room")]
    DuplicateChannel(ChannelId),
    #[error("channel {0} is not a participant of this room")]
    ParticipantNotFound(ChannelId),
}

/// Repository 層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("channel not found: {0}")]
    ClientNotFound(String),
    #[error("channel {0} is already bound to a room")]
    AlreadyBound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// アカウントストア（ロール参照）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
    #[error("user directory lookup timed out")]
    Timeout,
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
}
