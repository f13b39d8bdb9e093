//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ChannelIdFactory, OutboundEvent, UserId},
    ui::state::AppState,
};

use super::session::ChannelSession;

/// Header set by the upstream authentication component on the upgrade request
pub const IDENTITY_HEADER: &str = "x-authenticated-user";

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let authenticated_user = match headers.get(IDENTITY_HEADER) {
        Some(value) => {
            let user = value
                .to_str()
                .ok()
                .and_then(|s| UserId::new(s.to_string()).ok());
            match user {
                Some(user) => Some(user),
                None => {
                    tracing::warn!("Invalid {} header, rejecting upgrade", IDENTITY_HEADER);
                    return Err(StatusCode::BAD_REQUEST);
                }
            }
        }
        None if state.require_identity_header => {
            tracing::warn!("Missing {} header, rejecting upgrade", IDENTITY_HEADER);
            return Err(StatusCode::UNAUTHORIZED);
        }
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, authenticated_user)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Everything addressed to this channel (its own replies and room broadcasts) flows
/// through `rx`, so frames reach the client in the order they were pushed.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Spawns a task that hands received frames to the session one at a time.
///
/// The loop ends once the receive task has stopped and every queued frame is handled.
fn dispatch_loop(
    mut frames: mpsc::UnboundedReceiver<String>,
    session: ChannelSession,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(text) = frames.recv().await {
            session.handle_text(&text).await;
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    authenticated_user: Option<UserId>,
) {
    let channel_id = ChannelIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    state
        .message_pusher
        .register_client(channel_id.clone(), tx)
        .await;
    tracing::info!(
        channel_id = %channel_id,
        authenticated_user = authenticated_user.as_ref().map(|u| u.as_str()),
        "Client connected"
    );

    // 自分のチャンネル ID を通知
    if let Err(e) = state
        .message_pusher
        .push_to(
            &channel_id,
            &OutboundEvent::Connected {
                channel_id: channel_id.clone(),
            },
        )
        .await
    {
        tracing::error!(channel_id = %channel_id, "Failed to send greeting: {}", e);
    }

    let (sender, mut receiver) = socket.split();
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let recv_channel_id = channel_id.clone();

    // Spawn a task to receive frames from this client.
    // 参加処理の完了を待たずに読み続け、切断をすぐに検出する
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!(channel_id = %recv_channel_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if frames_tx.send(text.as_str().to_string()).is_err() {
                        break;
                    }
                }
                Message::Binary(_) => {
                    tracing::warn!(channel_id = %recv_channel_id, "Dropping binary frame");
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!(channel_id = %recv_channel_id, "Client requested close");
                    break;
                }
                Message::Pong(_) => {}
            }
        }
    });

    // Spawn a task to dispatch received frames in arrival order
    let session = ChannelSession::new(state.clone(), channel_id.clone(), authenticated_user);
    let dispatch_task = dispatch_loop(frames_rx, session);

    // Spawn a task to forward pushed events to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other.
    let send_finished = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => true,
    };
    if send_finished {
        recv_task.abort();
        let _ = recv_task.await;
    } else {
        // 送信側の受け口を閉じると、ロール取得中の参加処理が切断を検出して巻き戻す
        send_task.abort();
        let _ = send_task.await;
    }

    // 受信済みのイベントを処理し終えてから後片付けを行う
    let _ = dispatch_task.await;

    match state
        .disconnect_participant_usecase
        .execute(&channel_id)
        .await
    {
        Some(participant) => tracing::info!(
            channel_id = %channel_id,
            user_id = %participant.user_id,
            "Client disconnected and left its room"
        ),
        None => tracing::info!(channel_id = %channel_id, "Client disconnected"),
    }
}
