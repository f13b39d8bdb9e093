//! サーバーからクライアントへ送るイベント
//!
//! UseCase はこの型で通知内容を組み立て、MessagePusher がワイヤー形式に変換して送信します。

use super::{
    entity::{ChatMessage, Participant, StrokeEvent},
    permission::ControlUpdate,
    value_object::{ChannelId, DisplayName, PeerId, RoomId, UserId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// 接続直後の挨拶（自分のチャンネル ID を伝える）
    Connected { channel_id: ChannelId },
    /// 参加完了（参加者本人のみ）
    RoomJoined {
        room_id: RoomId,
        participants: Vec<Participant>,
    },
    /// 参加失敗（参加者本人のみ）
    JoinRoomError {
        message: String,
        room_id: Option<RoomId>,
    },
    /// 新しい参加者の通知（既存の参加者へ）
    UserConnected {
        user_id: UserId,
        peer_id: PeerId,
        display_name: DisplayName,
    },
    /// 退出の通知（残りの参加者へ）
    UserDisconnected { user_id: UserId, peer_id: PeerId },
    /// 参加者一覧のスナップショット
    UserList { participants: Vec<Participant> },
    Draw { room_id: RoomId, stroke: StrokeEvent },
    CanvasCleared,
    WhiteboardHistory {
        room_id: RoomId,
        strokes: Vec<StrokeEvent>,
    },
    CreateMessage(ChatMessage),
    ChatHistory { messages: Vec<ChatMessage> },
    WhiteboardPermissionUpdate(ControlUpdate),
    RemoteCameraStatusChanged { peer_id: PeerId, is_enabled: bool },
    /// クライアントイベントの拒否（送信者のみ）
    EventRejected { event: String, message: String },
}

impl OutboundEvent {
    /// ワイヤー上のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Connected { .. } => "connected",
            OutboundEvent::RoomJoined { .. } => "room-joined",
            OutboundEvent::JoinRoomError { .. } => "join-room-error",
            OutboundEvent::UserConnected { .. } => "user-connected",
            OutboundEvent::UserDisconnected { .. } => "user-disconnected",
            OutboundEvent::UserList { .. } => "user-list",
            OutboundEvent::Draw { .. } => "draw",
            OutboundEvent::CanvasCleared => "canvas-cleared",
            OutboundEvent::WhiteboardHistory { .. } => "whiteboard-history",
            OutboundEvent::CreateMessage(_) => "createMessage",
            OutboundEvent::ChatHistory { .. } => "chat-history",
            OutboundEvent::WhiteboardPermissionUpdate(_) => "signal:whiteboard-permission-update",
            OutboundEvent::RemoteCameraStatusChanged { .. } => "remote-camera-status-changed",
            OutboundEvent::EventRejected { .. } => "error",
        }
    }
}
