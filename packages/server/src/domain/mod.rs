//! Domain layer
//!
//! 会議ルームの状態とその不変条件を表現します。外部への依存は trait として定義します。

pub mod color;
pub mod entity;
pub mod error;
pub mod event;
pub mod history;
pub mod message_pusher;
pub mod permission;
pub mod repository;
pub mod value_object;

pub use color::ParticipantColor;
pub use entity::{
    ChatMessage, HistoryLimits, Participant, Point, Role, Room, StrokeEvent, StrokeKind,
};
pub use error::{DirectoryError, DomainError, MessagePushError, RepositoryError, ValueObjectError};
pub use event::OutboundEvent;
pub use history::History;
pub use message_pusher::{ChannelBinding, MessagePusher, PusherChannel};
pub use permission::{ControlUpdate, arbitrate, initial_control};
pub use repository::{RoomGuard, RoomRepository, SessionRecord, SessionStore, UserDirectory};
pub use value_object::{
    ChannelId, ChannelIdFactory, DisplayName, MessageText, PeerId, RoomId, Timestamp, UserId,
};
