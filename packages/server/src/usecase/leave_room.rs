//! UseCase: 明示的な退出処理
//!
//! 切断と同じ後片付けを行いますが、チャンネルは開いたままなので
//! 同じ接続から再び参加できます。

use std::sync::Arc;

use crate::domain::{ChannelId, MessagePusher, Participant, RoomId};

use super::{error::LeaveError, teardown::RoomTeardown};

/// 退出のユースケース
pub struct LeaveRoomUseCase {
    message_pusher: Arc<dyn MessagePusher>,
    teardown: Arc<RoomTeardown>,
}

impl LeaveRoomUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>, teardown: Arc<RoomTeardown>) -> Self {
        Self {
            message_pusher,
            teardown,
        }
    }

    /// 退出を実行
    ///
    /// チャンネルが `room_id` に参加していなければ `NotInRoom` を返す。
    pub async fn execute(
        &self,
        channel_id: &ChannelId,
        room_id: &RoomId,
    ) -> Result<Option<Participant>, LeaveError> {
        match self.message_pusher.binding(channel_id).await {
            Some(binding) if &binding.room_id == room_id => {}
            _ => return Err(LeaveError::NotInRoom(room_id.clone())),
        }

        // 切断処理が先にバインディングを取り出した場合は、そちらが後片付けを行う
        let binding = self
            .message_pusher
            .take_binding(channel_id)
            .await
            .ok_or_else(|| LeaveError::NotInRoom(room_id.clone()))?;

        Ok(self.teardown.run(channel_id, binding).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Role, RoomRepository},
        usecase::test_support::{TestContext, drain, event_names, join_request, room, user},
    };

    #[tokio::test]
    async fn test_leave_notifies_remaining_participants() {
        // テスト項目: 退出すると残りの参加者に通知され、Session Registry が解除される
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[("u1", Role::Admin)]);
        let (u1, _rx1) = ctx.connect_and_join(&join, "r1", "u1").await.unwrap();
        let (_u2, mut rx2) = ctx.connect_and_join(&join, "r1", "u2").await.unwrap();
        let usecase = LeaveRoomUseCase::new(ctx.pusher.clone(), ctx.teardown());

        // when (操作):
        let removed = usecase.execute(&u1.channel_id, &room("r1")).await.unwrap();

        // then (期待する結果):
        assert_eq!(removed.unwrap().user_id, user("u1"));
        let frames = drain(&mut rx2);
        assert_eq!(event_names(&frames), vec!["user-disconnected", "user-list"]);
        assert_eq!(frames[0]["data"]["userId"], "u1");
        assert_eq!(frames[0]["data"]["peerConnectionId"], "peer-u1");
        assert_eq!(frames[1]["data"].as_array().unwrap().len(), 1);
        assert!(ctx.registry.current(&user("u1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_leave_keeps_channel_open_for_rejoin() {
        // テスト項目: 退出後も同じチャンネルから別のルームに参加できる
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[]);
        let (u1, _rx1) = ctx.connect_and_join(&join, "r1", "u1").await.unwrap();
        let usecase = LeaveRoomUseCase::new(ctx.pusher.clone(), ctx.teardown());
        usecase.execute(&u1.channel_id, &room("r1")).await.unwrap();

        // when (操作):
        let result = join
            .execute(join_request(u1.channel_id.clone(), "r2", "u1"))
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(ctx.rooms.get_room(&room("r1")).await.is_err());
    }

    #[tokio::test]
    async fn test_leave_wrong_room_is_rejected() {
        // テスト項目: 参加していないルームからの退出は拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[]);
        let (u1, _rx1) = ctx.connect_and_join(&join, "r1", "u1").await.unwrap();
        let usecase = LeaveRoomUseCase::new(ctx.pusher.clone(), ctx.teardown());

        // when (操作):
        let result = usecase.execute(&u1.channel_id, &room("r2")).await;

        // then (期待する結果):
        assert_eq!(result, Err(LeaveError::NotInRoom(room("r2"))));
        assert_eq!(
            ctx.rooms.get_room(&room("r1")).await.unwrap().participants().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_leave_twice_is_rejected() {
        // テスト項目: 2 回目の退出は NotInRoom になる（後片付けは 1 回だけ）
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[]);
        let (u1, _rx1) = ctx.connect_and_join(&join, "r1", "u1").await.unwrap();
        let usecase = LeaveRoomUseCase::new(ctx.pusher.clone(), ctx.teardown());
        usecase.execute(&u1.channel_id, &room("r1")).await.unwrap();

        // when (操作):
        let result = usecase.execute(&u1.channel_id, &room("r1")).await;

        // then (期待する結果):
        assert_eq!(result, Err(LeaveError::NotInRoom(room("r1"))));
    }
}
