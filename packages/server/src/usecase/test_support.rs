//! UseCase テスト用の共通部品

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ChannelId, DisplayName, HistoryLimits, MessagePusher, Participant, PeerId, Role, RoomId,
        UserDirectory, UserId,
    },
    infrastructure::{
        directory::InMemoryUserDirectory,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, InMemorySessionStore},
    },
};
use kaigi_shared::time::FixedClock;

use super::{
    error::JoinError,
    join_room::{JoinRequest, JoinRoomUseCase},
    session_registry::SessionRegistry,
    teardown::RoomTeardown,
};

pub(crate) const NOW: i64 = 1_700_000_000_000;

pub(crate) fn channel(user: &str) -> ChannelId {
    ChannelId::new(format!("ch-{user}")).unwrap()
}

pub(crate) fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub(crate) fn join_request(channel_id: ChannelId, room_id: &str, user_id: &str) -> JoinRequest {
    JoinRequest {
        channel_id,
        room_id: room(room_id),
        user_id: user(user_id),
        peer_id: PeerId::new(format!("peer-{user_id}")).unwrap(),
        display_name: DisplayName::new(format!("{user_id}-name")).unwrap(),
        authenticated_user: None,
    }
}

/// ルーム・接続・Session Registry を一式用意したテスト環境
pub(crate) struct TestContext {
    pub rooms: Arc<InMemoryRoomRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub registry: Arc<SessionRegistry>,
    pub clock: Arc<FixedClock>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_limits(HistoryLimits::default())
    }

    pub fn with_limits(limits: HistoryLimits) -> Self {
        let clock = Arc::new(FixedClock::new(NOW));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let rooms = Arc::new(InMemoryRoomRepository::new(clock.clone(), limits));
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(InMemorySessionStore::new()),
            pusher.clone(),
            clock.clone(),
        ));
        Self {
            rooms,
            pusher,
            registry,
            clock,
        }
    }

    /// `ch-<user>` のチャンネルを接続する
    pub async fn connect(&self, user: &str) -> (ChannelId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel_id = channel(user);
        self.pusher.register_client(channel_id.clone(), tx).await;
        (channel_id, rx)
    }

    pub fn join_usecase(&self, directory: Arc<dyn UserDirectory>) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.rooms.clone(),
            self.registry.clone(),
            self.pusher.clone(),
            directory,
            self.clock.clone(),
            Duration::from_millis(200),
        )
    }

    /// ロール表から JoinRoomUseCase を作る
    pub fn join_usecase_with_roles(&self, roles: &[(&str, Role)]) -> JoinRoomUseCase {
        let roles = roles
            .iter()
            .map(|(id, role)| (user(id), *role))
            .collect();
        self.join_usecase(Arc::new(InMemoryUserDirectory::new(roles)))
    }

    pub fn teardown(&self) -> Arc<RoomTeardown> {
        Arc::new(RoomTeardown::new(
            self.rooms.clone(),
            self.registry.clone(),
            self.pusher.clone(),
        ))
    }

    /// 接続して `room_id` に参加し、それまでに届いたフレームを読み捨てる
    pub async fn connect_and_join(
        &self,
        usecase: &JoinRoomUseCase,
        room_id: &str,
        user_id: &str,
    ) -> Result<(Participant, mpsc::UnboundedReceiver<String>), JoinError> {
        let (channel_id, mut rx) = self.connect(user_id).await;
        let participant = usecase
            .execute(join_request(channel_id, room_id, user_id))
            .await?;
        drain(&mut rx);
        Ok((participant, rx))
    }
}

/// 受信済みのフレームを全て取り出す
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    frames
}

pub(crate) fn event_names(frames: &[Value]) -> Vec<&str> {
    frames
        .iter()
        .map(|f| f["event"].as_str().unwrap())
        .collect()
}
