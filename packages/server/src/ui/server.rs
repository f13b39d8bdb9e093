//! Server wiring and execution.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{HistoryLimits, MessagePusher, RoomRepository, UserDirectory},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, InMemorySessionStore},
    },
    usecase::{
        CameraStatusUseCase, ClearCanvasUseCase, DisconnectParticipantUseCase, DrawStrokeUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase, RoomTeardown,
        SendMessageUseCase, SessionRegistry, SetWhiteboardPermissionUseCase,
    },
};
use kaigi_shared::time::Clock;

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Runtime knobs the server needs beyond its collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    pub history_limits: HistoryLimits,
    pub role_lookup_timeout: Duration,
    pub require_identity_header: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            history_limits: HistoryLimits::default(),
            role_lookup_timeout: Duration::from_secs(3),
            require_identity_header: false,
        }
    }
}

impl From<&ServerConfig> for ServerOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            history_limits: config.history_limits(),
            role_lookup_timeout: config.role_lookup_timeout(),
            require_identity_header: config.require_identity_header,
        }
    }
}

/// Meeting signaling server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(directory, Arc::new(SystemClock), ServerOptions::default());
/// server.run("127.0.0.1".to_string(), 5000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Wire repositories, the message pusher and the use cases around the given
    /// role directory and clock.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        options: ServerOptions,
    ) -> Self {
        // 1. Repository（ルームと Session Record の保存先）
        let rooms: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new(
            clock.clone(),
            options.history_limits,
        ));
        let session_store = Arc::new(InMemorySessionStore::new());

        // 2. MessagePusher（WebSocket 実装）
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 3. Session Registry と後片付け
        let sessions = Arc::new(SessionRegistry::new(
            session_store,
            message_pusher.clone(),
            clock.clone(),
        ));
        let teardown = Arc::new(RoomTeardown::new(
            rooms.clone(),
            sessions.clone(),
            message_pusher.clone(),
        ));

        // 4. UseCases
        let state = AppState {
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                rooms.clone(),
                sessions,
                message_pusher.clone(),
                directory,
                clock.clone(),
                options.role_lookup_timeout,
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                message_pusher.clone(),
                teardown.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                message_pusher.clone(),
                teardown,
            )),
            draw_stroke_usecase: Arc::new(DrawStrokeUseCase::new(
                rooms.clone(),
                message_pusher.clone(),
            )),
            clear_canvas_usecase: Arc::new(ClearCanvasUseCase::new(
                rooms.clone(),
                message_pusher.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                rooms.clone(),
                message_pusher.clone(),
                clock,
            )),
            set_whiteboard_permission_usecase: Arc::new(SetWhiteboardPermissionUseCase::new(
                rooms.clone(),
                message_pusher.clone(),
            )),
            camera_status_usecase: Arc::new(CameraStatusUseCase::new(
                rooms.clone(),
                message_pusher.clone(),
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(rooms.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(rooms)),
            message_pusher,
            require_identity_header: options.require_identity_header,
        };

        Self {
            state: Arc::new(state),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router with every endpoint mounted
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Run the signaling server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Signaling server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
