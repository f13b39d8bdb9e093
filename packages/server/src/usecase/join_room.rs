//! UseCase: ルーム参加処理
//!
//! ## 状態遷移
//!
//! `Connecting -> Validating -> Joined`
//!
//! 1. チャンネルにルームを仮割り当て（1 チャンネル 1 ルーム）
//! 2. Session Registry へのバインド（二重参加の検出）
//! 3. アカウントストアからロールを取得（タイムアウト付き）
//! 4. ルームをロックし、参加者を登録
//! 5. 履歴の再生と参加者一覧のブロードキャスト
//!
//! ロール取得の完了前に接続が切れた場合や、取得に失敗した場合は
//! 1, 2 の部分状態を巻き戻します。ロール取得中の参加者は他の参加者から見えません。
//!
//! ## 配信順序
//!
//! 手順 4, 5 はルームのロックを保持したまま行うため、参加者は
//! 履歴の再生を受け取る前に後続の描画イベントを受け取ることはありません。

use std::{sync::Arc, time::Duration};

use crate::domain::{
    ChannelBinding, ChannelId, DisplayName, MessagePushError, MessagePusher, OutboundEvent,
    Participant, PeerId, Role, RoomId, RoomRepository, Timestamp, UserDirectory, UserId,
    initial_control,
};
use kaigi_shared::time::Clock;

use super::{
    error::{JoinError, SessionError},
    session_registry::SessionRegistry,
};

/// 参加要求（検証済み）
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub channel_id: ChannelId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub peer_id: PeerId,
    pub display_name: DisplayName,
    /// 上流の認証コンポーネントが接続時に示したアイデンティティ
    pub authenticated_user: Option<UserId>,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    sessions: Arc<SessionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    role_lookup_timeout: Duration,
}

impl JoinRoomUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        sessions: Arc<SessionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        role_lookup_timeout: Duration,
    ) -> Self {
        Self {
            rooms,
            sessions,
            message_pusher,
            directory,
            clock,
            role_lookup_timeout,
        }
    }

    /// 参加を実行
    ///
    /// 成功時は登録された Participant を返す。失敗時は部分状態を巻き戻した上でエラーを返す。
    pub async fn execute(&self, request: JoinRequest) -> Result<Participant, JoinError> {
        if let Some(authenticated) = &request.authenticated_user {
            if authenticated != &request.user_id {
                tracing::warn!(
                    channel_id = %request.channel_id,
                    user_id = %request.user_id,
                    authenticated_user = %authenticated,
                    "Join rejected: identity mismatch"
                );
                return Err(JoinError::IdentityMismatch);
            }
        }

        // 1. チャンネルにルームを仮割り当て
        self.claim_channel(&request).await?;

        // 2. Session Registry へのバインド
        if let Err(e) = self
            .sessions
            .bind(&request.user_id, &request.room_id, &request.channel_id)
            .await
        {
            self.message_pusher.take_binding(&request.channel_id).await;
            return Err(match e {
                SessionError::Conflict(room_id) => JoinError::AlreadyInMeeting(room_id),
                SessionError::Store(e) => JoinError::Repository(e.to_string()),
            });
        }

        // 3. ロールの取得
        let role = match self.lookup_role(&request.user_id).await {
            Ok(role) => role,
            Err(e) => {
                self.rollback(&request).await;
                return Err(e);
            }
        };

        if !self.message_pusher.is_connected(&request.channel_id).await {
            self.rollback(&request).await;
            return Err(JoinError::ChannelClosed);
        }

        // 4. ルームへの登録
        let mut room = match self.rooms.open_room(&request.room_id).await {
            Ok(room) => room,
            Err(e) => {
                self.rollback(&request).await;
                return Err(JoinError::Repository(e.to_string()));
            }
        };

        if !self.message_pusher.is_connected(&request.channel_id).await {
            self.rooms.close_if_empty(room).await;
            self.rollback(&request).await;
            return Err(JoinError::ChannelClosed);
        }

        let participant = Participant::new(
            request.user_id.clone(),
            request.display_name.clone(),
            request.channel_id.clone(),
            request.peer_id.clone(),
            role,
            initial_control(&room, role),
            Timestamp::new(self.clock.now_millis()),
        );
        if let Err(e) = room.add_participant(participant.clone()) {
            self.rooms.close_if_empty(room).await;
            self.rollback(&request).await;
            return Err(JoinError::Repository(e.to_string()));
        }

        tracing::info!(
            room_id = %request.room_id,
            channel_id = %request.channel_id,
            user_id = %request.user_id,
            role = role.as_str(),
            has_whiteboard_control = participant.has_whiteboard_control,
            participants = room.participants().len(),
            "Participant joined"
        );

        // 5. 参加者本人への確認と履歴の再生、ルーム全体への通知
        let joiner = &request.channel_id;
        let participants = room.participants().to_vec();
        let events = [
            OutboundEvent::RoomJoined {
                room_id: request.room_id.clone(),
                participants: participants.clone(),
            },
            OutboundEvent::WhiteboardHistory {
                room_id: request.room_id.clone(),
                strokes: room.whiteboard().replay(),
            },
            OutboundEvent::ChatHistory {
                messages: room.chat().replay(),
            },
        ];
        for event in &events {
            if let Err(e) = self.message_pusher.push_to(joiner, event).await {
                tracing::warn!(channel_id = %joiner, event = event.name(), "Failed to push: {}", e);
            }
        }

        self.broadcast(room.channel_ids(), OutboundEvent::UserList { participants })
            .await;
        self.broadcast(
            room.channel_ids_except(joiner),
            OutboundEvent::UserConnected {
                user_id: participant.user_id.clone(),
                peer_id: participant.peer_id.clone(),
                display_name: participant.display_name.clone(),
            },
        )
        .await;

        Ok(participant)
    }

    async fn claim_channel(&self, request: &JoinRequest) -> Result<(), JoinError> {
        let binding = ChannelBinding {
            room_id: request.room_id.clone(),
            user_id: request.user_id.clone(),
        };
        match self
            .message_pusher
            .bind(&request.channel_id, binding)
            .await
        {
            Ok(()) => Ok(()),
            Err(MessagePushError::AlreadyBound(_)) => {
                let current = self
                    .message_pusher
                    .binding(&request.channel_id)
                    .await
                    .map(|b| b.room_id)
                    .unwrap_or_else(|| request.room_id.clone());
                tracing::warn!(
                    channel_id = %request.channel_id,
                    room_id = %request.room_id,
                    joined_room_id = %current,
                    "Join rejected: channel already joined a room"
                );
                Err(JoinError::ChannelAlreadyJoined(current))
            }
            Err(_) => Err(JoinError::ChannelClosed),
        }
    }

    async fn lookup_role(&self, user_id: &UserId) -> Result<Role, JoinError> {
        let lookup = self.directory.get_user_role(user_id);
        match tokio::time::timeout(self.role_lookup_timeout, lookup).await {
            Ok(Ok(Some(role))) => Ok(role),
            Ok(Ok(None)) => {
                tracing::warn!(user_id = %user_id, "No account record found, joining as user");
                Ok(Role::User)
            }
            Ok(Err(e)) => {
                tracing::error!(user_id = %user_id, "Role lookup failed: {}", e);
                Err(JoinError::RoleLookupFailed(e.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    user_id = %user_id,
                    timeout_ms = self.role_lookup_timeout.as_millis() as u64,
                    "Role lookup timed out"
                );
                Err(JoinError::RoleLookupFailed("lookup timed out".to_string()))
            }
        }
    }

    /// 仮割り当てと Session Registry へのバインドを取り消す
    async fn rollback(&self, request: &JoinRequest) {
        if let Err(e) = self
            .sessions
            .unbind(&request.user_id, &request.channel_id)
            .await
        {
            tracing::error!(user_id = %request.user_id, "Failed to roll back session: {}", e);
        }
        self.message_pusher.take_binding(&request.channel_id).await;
        tracing::debug!(
            channel_id = %request.channel_id,
            room_id = %request.room_id,
            "Join rolled back"
        );
    }

    async fn broadcast(&self, targets: Vec<ChannelId>, event: OutboundEvent) {
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!(event = event.name(), "Failed to broadcast: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ChatMessage, DirectoryError, MessageText, ParticipantColor, Point, StrokeEvent,
            StrokeKind, repository::MockUserDirectory,
        },
        usecase::test_support::{TestContext, channel, drain, event_names, join_request, room, user},
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 参加時の通知順序（本人への確認・履歴再生、全体への一覧、既存参加者への通知）
    // - 二重参加の拒否と stale セッションの上書き
    // - ロール取得失敗・タイムアウト時の巻き戻し
    // - 初期のホワイトボード権限
    // ========================================

    fn control_flags(frame: &serde_json::Value) -> Vec<(String, bool)> {
        frame["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| {
                (
                    p["userId"].as_str().unwrap().to_string(),
                    p["hasWhiteboardControl"].as_bool().unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_join_event_order_for_joiner_and_others() {
        // テスト項目: 参加者本人と既存参加者が受け取るイベントの順序
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[("u1", Role::Admin)]);
        let (c1, mut rx1) = ctx.connect("u1").await;
        let (c2, mut rx2) = ctx.connect("u2").await;

        // when (操作):
        usecase.execute(join_request(c1, "r1", "u1")).await.unwrap();
        let u1_first = drain(&mut rx1);
        usecase.execute(join_request(c2, "r1", "u2")).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            event_names(&u1_first),
            vec!["room-joined", "whiteboard-history", "chat-history", "user-list"]
        );
        assert_eq!(
            control_flags(&u1_first[3]),
            vec![("u1".to_string(), true)]
        );

        let u2_frames = drain(&mut rx2);
        assert_eq!(
            event_names(&u2_frames),
            vec!["room-joined", "whiteboard-history", "chat-history", "user-list"]
        );
        assert_eq!(
            control_flags(&u2_frames[3]),
            vec![("u1".to_string(), true), ("u2".to_string(), false)]
        );

        let u1_frames = drain(&mut rx1);
        assert_eq!(event_names(&u1_frames), vec!["user-list", "user-connected"]);
        assert_eq!(u1_frames[1]["data"]["userId"], "u2");
        assert_eq!(u1_frames[1]["data"]["peerConnectionId"], "peer-u2");
        assert_eq!(u1_frames[1]["data"]["username"], "u2-name");
    }

    #[tokio::test]
    async fn test_join_replays_history_in_append_order() {
        // テスト項目: 参加者は追加順のまま全ての履歴を受け取る
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[]);
        ctx.connect_and_join(&usecase, "r1", "u1").await.unwrap();
        {
            let mut guard = ctx.rooms.lock_room(&room("r1")).await.unwrap();
            let strokes = [
                (StrokeKind::Begin, Some(Point { x: 0.0, y: 0.0 })),
                (StrokeKind::Draw, Some(Point { x: 5.0, y: 5.0 })),
                (StrokeKind::End, None),
            ];
            for (kind, point) in strokes {
                guard
                    .whiteboard_mut()
                    .append(StrokeEvent::new(kind, point, None, None).unwrap());
            }
            for text in ["first", "second"] {
                guard.chat_mut().append(ChatMessage {
                    display_name: DisplayName::new("u1-name".to_string()).unwrap(),
                    text: MessageText::new(text.to_string()).unwrap(),
                    color: ParticipantColor::from_identity(&user("u1")),
                    sent_at: Timestamp::new(1),
                });
            }
        }
        let (c2, mut rx2) = ctx.connect("u2").await;

        // when (操作):
        usecase.execute(join_request(c2, "r1", "u2")).await.unwrap();

        // then (期待する結果):
        let frames = drain(&mut rx2);
        let strokes: Vec<&str> = frames[1]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["type"].as_str().unwrap())
            .collect();
        assert_eq!(strokes, vec!["begin", "draw", "end"]);
        assert_eq!(frames[1]["data"][1]["x"], 5.0);
        let messages: Vec<&str> = frames[2]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["message"].as_str().unwrap())
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_join_from_second_live_connection_conflicts() {
        // テスト項目: 接続中のセッションがあるアイデンティティの参加は、バインド中のルーム ID 付きで拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[]);
        let (_first, _rx1) = ctx.connect_and_join(&usecase, "r1", "u1").await.unwrap();
        let (second, _rx2) = ctx.connect("u1-tab2").await;

        // when (操作):
        let result = usecase.execute(join_request(second.clone(), "r2", "u1")).await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::AlreadyInMeeting(room("r1"))));
        assert_eq!(result.unwrap_err().conflicting_room(), Some(&room("r1")));
        assert!(ctx.pusher.binding(&second).await.is_none());
        assert!(ctx.rooms.get_room(&room("r2")).await.is_err());
    }

    #[tokio::test]
    async fn test_join_overrides_stale_session() {
        // テスト項目: 以前のチャンネルが切断済みなら、新しい参加が記録を上書きする
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[]);
        let (old, _rx) = ctx.connect_and_join(&usecase, "r1", "u1").await.unwrap();
        ctx.pusher.unregister_client(&old.channel_id).await;
        let (fresh, _rx2) = ctx.connect("u1-new").await;

        // when (操作):
        let result = usecase.execute(join_request(fresh.clone(), "r2", "u1")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let record = ctx.registry.current(&user("u1")).await.unwrap().unwrap();
        assert_eq!(record.room_id, room("r2"));
        assert_eq!(record.channel_id, fresh);
    }

    #[tokio::test]
    async fn test_join_twice_on_same_channel_is_rejected() {
        // テスト項目: 参加済みのチャンネルからの再参加は拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[]);
        let (joined, _rx) = ctx.connect_and_join(&usecase, "r1", "u1").await.unwrap();

        // when (操作):
        let result = usecase
            .execute(join_request(joined.channel_id.clone(), "r2", "u1"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::ChannelAlreadyJoined(room("r1"))));
        let record = ctx.registry.current(&user("u1")).await.unwrap().unwrap();
        assert_eq!(record.room_id, room("r1"));
    }

    #[tokio::test]
    async fn test_role_lookup_failure_fails_closed() {
        // テスト項目: ロール取得に失敗すると参加は失敗し、部分状態が巻き戻される
        // given (前提条件):
        let ctx = TestContext::new();
        let mut directory = MockUserDirectory::new();
        directory
            .expect_get_user_role()
            .returning(|_| Err(DirectoryError::Unavailable("connection refused".to_string())));
        let usecase = ctx.join_usecase(Arc::new(directory));
        let (c1, _rx) = ctx.connect("u1").await;

        // when (操作):
        let result = usecase.execute(join_request(c1.clone(), "r1", "u1")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinError::RoleLookupFailed(_))));
        assert!(ctx.registry.current(&user("u1")).await.unwrap().is_none());
        assert!(ctx.pusher.binding(&c1).await.is_none());
        assert!(ctx.rooms.get_room(&room("r1")).await.is_err());
    }

    #[tokio::test]
    async fn test_role_lookup_timeout_fails_closed() {
        // テスト項目: ロール取得がタイムアウトすると参加は失敗する
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase(Arc::new(NeverRespondingDirectory));
        let (c1, _rx) = ctx.connect("u1").await;

        // when (操作):
        let result = usecase.execute(join_request(c1.clone(), "r1", "u1")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinError::RoleLookupFailed("lookup timed out".to_string()))
        );
        assert!(ctx.registry.current(&user("u1")).await.unwrap().is_none());
        assert!(ctx.pusher.binding(&c1).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_account_joins_as_user() {
        // テスト項目: アカウントが見つからない場合は一般ロールで参加する
        // given (前提条件):
        let ctx = TestContext::new();
        let mut directory = MockUserDirectory::new();
        directory.expect_get_user_role().returning(|_| Ok(None));
        let usecase = ctx.join_usecase(Arc::new(directory));
        let (c1, _rx) = ctx.connect("u1").await;

        // when (操作):
        let participant = usecase
            .execute(join_request(c1, "r1", "u1"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(participant.role, Role::User);
        assert!(!participant.has_whiteboard_control);
    }

    #[tokio::test]
    async fn test_identity_mismatch_is_rejected() {
        // テスト項目: 認証済みアイデンティティと異なる userId の参加は拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[]);
        let (c1, _rx) = ctx.connect("u1").await;
        let mut request = join_request(c1.clone(), "r1", "u1");
        request.authenticated_user = Some(user("mallory"));

        // when (操作):
        let result = usecase.execute(request).await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::IdentityMismatch));
        assert!(ctx.pusher.binding(&c1).await.is_none());
    }

    #[tokio::test]
    async fn test_join_on_closed_channel_is_rejected() {
        // テスト項目: 未接続のチャンネルからの参加は拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[]);

        // when (操作):
        let result = usecase
            .execute(join_request(channel("ghost"), "r1", "ghost"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::ChannelClosed));
        assert!(ctx.registry.current(&user("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_elevated_joiner_does_not_take_existing_control() {
        // テスト項目: 既に権限保持者がいる場合、特権ロールの参加者は権限を得ない
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = ctx.join_usecase_with_roles(&[("u1", Role::Admin), ("u3", Role::Admin)]);
        ctx.connect_and_join(&usecase, "r1", "u1").await.unwrap();

        // when (操作):
        let (second_admin, _rx) = ctx.connect_and_join(&usecase, "r1", "u3").await.unwrap();

        // then (期待する結果):
        assert!(!second_admin.has_whiteboard_control);
        let room = ctx.rooms.get_room(&room("r1")).await.unwrap();
        let holders: Vec<&str> = room
            .participants()
            .iter()
            .filter(|p| p.has_whiteboard_control)
            .map(|p| p.user_id.as_str())
            .collect();
        assert_eq!(holders, vec!["u1"]);
    }

    /// 応答しないアカウントストア
    struct NeverRespondingDirectory;

    #[async_trait::async_trait]
    impl UserDirectory for NeverRespondingDirectory {
        async fn get_user_role(&self, _user_id: &UserId) -> Result<Option<Role>, DirectoryError> {
            std::future::pending().await
        }
    }
}
