//! UseCase: ホワイトボードへの描画
//!
//! 描画権限を持つ参加者のストロークを履歴に追加し、他の参加者へ転送します。
//! 追加と転送はルームのロック内で行うため、転送順は履歴の順序と一致します。

use std::sync::Arc;

use crate::domain::{ChannelId, MessagePusher, OutboundEvent, RoomId, RoomRepository, StrokeEvent};

use super::{error::RoomEventError, room_access::lock_joined_room};

pub struct DrawStrokeUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DrawStrokeUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        channel_id: &ChannelId,
        room_id: &RoomId,
        stroke: StrokeEvent,
    ) -> Result<(), RoomEventError> {
        let mut room = lock_joined_room(
            self.rooms.as_ref(),
            self.message_pusher.as_ref(),
            channel_id,
            room_id,
        )
        .await?;

        let has_control = room
            .participant(channel_id)
            .is_some_and(|p| p.has_whiteboard_control);
        if !has_control {
            return Err(RoomEventError::NoWhiteboardControl);
        }

        if room.whiteboard_mut().append(stroke.clone()) {
            tracing::debug!(
                room_id = %room_id,
                evicted = room.whiteboard().evicted(),
                "Whiteboard history full, evicted oldest stroke"
            );
        }

        let event = OutboundEvent::Draw {
            room_id: room_id.clone(),
            stroke,
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(room.channel_ids_except(channel_id), &event)
            .await
        {
            tracing::warn!(room_id = %room_id, "Failed to forward stroke: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{HistoryLimits, Point, Role, StrokeKind},
        usecase::test_support::{TestContext, drain, event_names, join_request, room},
    };

    fn stroke(kind: StrokeKind, x: f64, y: f64) -> StrokeEvent {
        let point = match kind {
            StrokeKind::End => None,
            _ => Some(Point { x, y }),
        };
        StrokeEvent::new(kind, point, Some("#000".to_string()), Some(2.0)).unwrap()
    }

    #[tokio::test]
    async fn test_draw_is_forwarded_to_others_and_recorded() {
        // テスト項目: 権限保持者のストロークは他の参加者に転送され、履歴に残る
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[("a", Role::Admin)]);
        let (a, mut rx_a) = ctx.connect_and_join(&join, "r1", "a").await.unwrap();
        let (_b, mut rx_b) = ctx.connect_and_join(&join, "r1", "b").await.unwrap();
        drain(&mut rx_a);
        let usecase = DrawStrokeUseCase::new(ctx.rooms.clone(), ctx.pusher.clone());

        // when (操作):
        usecase
            .execute(&a.channel_id, &room("r1"), stroke(StrokeKind::Begin, 1.0, 2.0))
            .await
            .unwrap();

        // then (期待する結果):
        let frames = drain(&mut rx_b);
        assert_eq!(event_names(&frames), vec!["draw"]);
        assert_eq!(frames[0]["data"]["roomId"], "r1");
        assert_eq!(frames[0]["data"]["type"], "begin");
        assert_eq!(frames[0]["data"]["lineWidth"], 2.0);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(ctx.rooms.get_room(&room("r1")).await.unwrap().whiteboard().len(), 1);
    }

    #[tokio::test]
    async fn test_draw_without_control_is_rejected() {
        // テスト項目: 描画権限のない参加者のストロークは拒否され、履歴にも残らない
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[("a", Role::Admin)]);
        let (_a, mut rx_a) = ctx.connect_and_join(&join, "r1", "a").await.unwrap();
        let (b, _rx_b) = ctx.connect_and_join(&join, "r1", "b").await.unwrap();
        drain(&mut rx_a);
        let usecase = DrawStrokeUseCase::new(ctx.rooms.clone(), ctx.pusher.clone());

        // when (操作):
        let result = usecase
            .execute(&b.channel_id, &room("r1"), stroke(StrokeKind::Begin, 1.0, 2.0))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomEventError::NoWhiteboardControl));
        assert!(drain(&mut rx_a).is_empty());
        assert!(ctx.rooms.get_room(&room("r1")).await.unwrap().whiteboard().is_empty());
    }

    #[tokio::test]
    async fn test_draw_for_other_room_is_rejected() {
        // テスト項目: 参加していないルームへの描画は拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[("a", Role::Admin)]);
        let (a, _rx_a) = ctx.connect_and_join(&join, "r1", "a").await.unwrap();
        let usecase = DrawStrokeUseCase::new(ctx.rooms.clone(), ctx.pusher.clone());

        // when (操作):
        let result = usecase
            .execute(&a.channel_id, &room("r2"), stroke(StrokeKind::End, 0.0, 0.0))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomEventError::NotInRoom(room("r2"))));
    }

    #[tokio::test]
    async fn test_late_joiner_sees_replay_before_live_strokes() {
        // テスト項目: 途中参加者は履歴の再生を受け取った後にのみ新しいストロークを受け取る
        // given (前提条件):
        let ctx = TestContext::new();
        let join = ctx.join_usecase_with_roles(&[("a", Role::Admin)]);
        let (a, _rx_a) = ctx.connect_and_join(&join, "r1", "a").await.unwrap();
        let usecase = DrawStrokeUseCase::new(ctx.rooms.clone(), ctx.pusher.clone());
        for (kind, x) in [(StrokeKind::Begin, 0.0), (StrokeKind::Draw, 5.0), (StrokeKind::End, 0.0)] {
            usecase
                .execute(&a.channel_id, &room("r1"), stroke(kind, x, x))
                .await
                .unwrap();
        }
        let (b_channel, mut rx_b) = ctx.connect("b").await;

        // when (操作):
        join.execute(join_request(b_channel, "r1", "b")).await.unwrap();
        usecase
            .execute(&a.channel_id, &room("r1"), stroke(StrokeKind::Begin, 9.0, 9.0))
            .await
            .unwrap();

        // then (期待する結果):
        let frames = drain(&mut rx_b);
        assert_eq!(
            event_names(&frames),
            vec!["room-joined", "whiteboard-history", "chat-history", "user-list", "draw"]
        );
        let replay: Vec<&str> = frames[1]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["type"].as_str().unwrap())
            .collect();
        assert_eq!(replay, vec!["begin", "draw", "end"]);
        assert_eq!(frames[1]["data"][0]["x"], 0.0);
        assert_eq!(frames[1]["data"][1]["x"], 5.0);
        assert_eq!(frames[4]["data"]["x"], 9.0);
    }

    #[tokio::test]
    async fn test_stroke_history_is_bounded() {
        // テスト項目: 履歴の上限を超えると最も古いストロークから破棄される
        // given (前提条件):
        let ctx = TestContext::with_limits(HistoryLimits {
            strokes: 2,
            messages: 10,
        });
        let join = ctx.join_usecase_with_roles(&[("a", Role::Admin)]);
        let (a, _rx_a) = ctx.connect_and_join(&join, "r1", "a").await.unwrap();
        let usecase = DrawStrokeUseCase::new(ctx.rooms.clone(), ctx.pusher.clone());

        // when (操作):
        for x in [1.0, 2.0, 3.0] {
            usecase
                .execute(&a.channel_id, &room("r1"), stroke(StrokeKind::Draw, x, x))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let snapshot = ctx.rooms.get_room(&room("r1")).await.unwrap();
        let xs: Vec<f64> = snapshot
            .whiteboard()
            .replay()
            .iter()
            .map(|s| s.point.unwrap().x)
            .collect();
        assert_eq!(xs, vec![2.0, 3.0]);
        assert_eq!(snapshot.whiteboard().evicted(), 1);
    }
}
