//! Per-connection event dispatcher.
//!
//! One `ChannelSession` is built when a WebSocket is accepted and dropped with it.
//! Inbound frames are handled one at a time, in arrival order.

use std::sync::Arc;

use crate::{
    domain::{
        ChannelId, DisplayName, MessageText, OutboundEvent, PeerId, RoomId, StrokeEvent, UserId,
        ValueObjectError,
    },
    infrastructure::dto::websocket::{
        CameraStatusPayload, ChatSendPayload, ClientMessage, JoinRoomPayload, LeaveRoomPayload,
        RoomPayload, SetPermissionPayload, StrokeDto,
    },
    ui::state::AppState,
    usecase::{JoinError, JoinRequest, LeaveError, RoomEventError},
};

const JOIN_ROOM_EVENT: &str = "join-room";

pub(crate) struct ChannelSession {
    state: Arc<AppState>,
    channel_id: ChannelId,
    /// Identity asserted on the upgrade request, if any
    authenticated_user: Option<UserId>,
}

impl ChannelSession {
    pub(crate) fn new(
        state: Arc<AppState>,
        channel_id: ChannelId,
        authenticated_user: Option<UserId>,
    ) -> Self {
        Self {
            state,
            channel_id,
            authenticated_user,
        }
    }

    /// Dispatch one text frame
    pub(crate) async fn handle_text(&self, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                self.handle_malformed(text, &e).await;
                return;
            }
        };

        let event = message.event_name();
        tracing::debug!(channel_id = %self.channel_id, event, "Received event");

        let result = match message {
            ClientMessage::JoinRoom(payload) => {
                self.join_room(payload).await;
                return;
            }
            ClientMessage::LeaveRoom(payload) => self.leave_room(payload).await,
            ClientMessage::Draw(stroke) => self.draw(stroke).await,
            ClientMessage::ClearCanvas(payload) => self.clear_canvas(payload).await,
            ClientMessage::Message(payload) => self.send_message(payload).await,
            ClientMessage::SetWhiteboardPermission(payload) => {
                self.set_whiteboard_permission(payload).await
            }
            ClientMessage::CameraStatusChanged(payload) => self.camera_status(payload).await,
        };

        if let Err(e) = result {
            self.reject(event, &e).await;
        }
    }

    async fn join_room(&self, payload: JoinRoomPayload) {
        let result = match self.join_request(payload) {
            Ok(request) => self.state.join_room_usecase.execute(request).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(channel_id = %self.channel_id, "Join failed: {}", e);
            self.push_join_error(e.to_string(), e.conflicting_room().cloned())
                .await;
        }
    }

    fn join_request(&self, payload: JoinRoomPayload) -> Result<JoinRequest, JoinError> {
        let invalid = |e: ValueObjectError| JoinError::InvalidRequest(e.to_string());
        Ok(JoinRequest {
            channel_id: self.channel_id.clone(),
            room_id: RoomId::new(payload.room_id).map_err(invalid)?,
            user_id: UserId::new(payload.user_id).map_err(invalid)?,
            peer_id: PeerId::new(payload.peer_connection_id).map_err(invalid)?,
            display_name: DisplayName::new(payload.username).map_err(invalid)?,
            authenticated_user: self.authenticated_user.clone(),
        })
    }

    async fn leave_room(&self, payload: LeaveRoomPayload) -> Result<(), RoomEventError> {
        let room_id = parse(RoomId::new(payload.room_id))?;
        match self
            .state
            .leave_room_usecase
            .execute(&self.channel_id, &room_id)
            .await
        {
            Ok(_) => Ok(()),
            Err(LeaveError::NotInRoom(room_id)) => Err(RoomEventError::NotInRoom(room_id)),
        }
    }

    async fn draw(&self, stroke: StrokeDto) -> Result<(), RoomEventError> {
        let room_id = parse(RoomId::new(stroke.room_id.clone()))?;
        let stroke = parse(StrokeEvent::try_from(stroke))?;
        self.state
            .draw_stroke_usecase
            .execute(&self.channel_id, &room_id, stroke)
            .await
    }

    async fn clear_canvas(&self, payload: RoomPayload) -> Result<(), RoomEventError> {
        let room_id = parse(RoomId::new(payload.room_id))?;
        self.state
            .clear_canvas_usecase
            .execute(&self.channel_id, &room_id)
            .await
    }

    async fn send_message(&self, payload: ChatSendPayload) -> Result<(), RoomEventError> {
        let room_id = parse(RoomId::new(payload.room_id))?;
        let text = parse(MessageText::new(payload.message))?;
        self.state
            .send_message_usecase
            .execute(&self.channel_id, &room_id, text)
            .await
            .map(|_| ())
    }

    async fn set_whiteboard_permission(
        &self,
        payload: SetPermissionPayload,
    ) -> Result<(), RoomEventError> {
        let room_id = parse(RoomId::new(payload.room_id))?;
        let target = parse(ChannelId::new(payload.target_socket_id))?;
        self.state
            .set_whiteboard_permission_usecase
            .execute(&self.channel_id, &room_id, &target, payload.has_control)
            .await
            .map(|_| ())
    }

    async fn camera_status(&self, payload: CameraStatusPayload) -> Result<(), RoomEventError> {
        let room_id = parse(RoomId::new(payload.room_id))?;
        let peer_id = parse(PeerId::new(payload.peer_id))?;
        self.state
            .camera_status_usecase
            .execute(&self.channel_id, &room_id, &peer_id, payload.is_enabled)
            .await
    }

    /// A frame that is not a well-formed client event.
    ///
    /// A broken `join-room` still gets a `join-room-error` so the client is not
    /// left waiting; anything else is dropped.
    async fn handle_malformed(&self, text: &str, error: &serde_json::Error) {
        let event = serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|value| value.get("event")?.as_str().map(str::to_string));

        tracing::warn!(
            channel_id = %self.channel_id,
            event = event.as_deref().unwrap_or("<none>"),
            "Dropping malformed frame: {}",
            error
        );

        if event.as_deref() == Some(JOIN_ROOM_EVENT) {
            let e = JoinError::InvalidRequest(error.to_string());
            self.push_join_error(e.to_string(), None).await;
        }
    }

    async fn push_join_error(&self, message: String, room_id: Option<RoomId>) {
        self.push(&OutboundEvent::JoinRoomError { message, room_id })
            .await;
    }

    async fn reject(&self, event: &str, error: &RoomEventError) {
        tracing::warn!(
            channel_id = %self.channel_id,
            event,
            "Event rejected: {}",
            error
        );
        self.push(&OutboundEvent::EventRejected {
            event: event.to_string(),
            message: error.to_string(),
        })
        .await;
    }

    async fn push(&self, event: &OutboundEvent) {
        if let Err(e) = self
            .state
            .message_pusher
            .push_to(&self.channel_id, event)
            .await
        {
            tracing::warn!(
                channel_id = %self.channel_id,
                event = event.name(),
                "Failed to push: {}",
                e
            );
        }
    }
}

fn parse<T>(result: Result<T, ValueObjectError>) -> Result<T, RoomEventError> {
    result.map_err(|e| RoomEventError::InvalidPayload(e.to_string()))
}
