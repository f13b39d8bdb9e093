//! Entities
//!
//! Participant / Room / StrokeEvent / ChatMessage を定義します。
//! Room は参加者リストと 2 つの History Store（ホワイトボード・チャット）を所有します。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{
    color::ParticipantColor,
    error::{DomainError, ValueObjectError},
    history::History,
    value_object::{ChannelId, DisplayName, MessageText, PeerId, RoomId, Timestamp, UserId},
};

/// Maximum length of a stroke color string
pub const MAX_STROKE_COLOR_LENGTH: usize = 64;

/// 参加者のロール
///
/// アカウントストアのロールに対応する。会議内で特権を持つのは `Admin` のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    /// ホワイトボード権限の既定保持者であり、権限変更を行えるロールか
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            other => Err(ValueObjectError::UnknownRole(other.to_string())),
        }
    }
}

/// ルーム内の 1 ユーザーの在室情報
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub channel_id: ChannelId,
    pub peer_id: PeerId,
    pub color: ParticipantColor,
    pub role: Role,
    pub has_whiteboard_control: bool,
    pub camera_enabled: bool,
    pub joined_at: Timestamp,
}

impl Participant {
    /// 新しい参加者を作成（色は ID から決定的に導出される）
    pub fn new(
        user_id: UserId,
        display_name: DisplayName,
        channel_id: ChannelId,
        peer_id: PeerId,
        role: Role,
        has_whiteboard_control: bool,
        joined_at: Timestamp,
    ) -> Self {
        let color = ParticipantColor::from_identity(&user_id);
        Self {
            user_id,
            display_name,
            channel_id,
            peer_id,
            color,
            role,
            has_whiteboard_control,
            camera_enabled: true,
            joined_at,
        }
    }
}

/// ストロークの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    Begin,
    Draw,
    End,
}

/// キャンバス上の座標
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// ホワイトボードの描画プリミティブ 1 件
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeEvent {
    pub kind: StrokeKind,
    pub point: Option<Point>,
    pub color: Option<String>,
    pub width: Option<f64>,
}

impl StrokeEvent {
    /// 検証済みの StrokeEvent を作成
    ///
    /// `begin` / `draw` は有限な座標を必須とする。`end` は座標を持たなくてよい。
    pub fn new(
        kind: StrokeKind,
        point: Option<Point>,
        color: Option<String>,
        width: Option<f64>,
    ) -> Result<Self, ValueObjectError> {
        match (kind, point) {
            (StrokeKind::Begin | StrokeKind::Draw, None) => {
                return Err(ValueObjectError::InvalidStroke("missing position"));
            }
            (_, Some(p)) if !p.x.is_finite() || !p.y.is_finite() => {
                return Err(ValueObjectError::InvalidStroke("non-finite position"));
            }
            _ => {}
        }
        if let Some(w) = width {
            if !w.is_finite() || w <= 0.0 {
                return Err(ValueObjectError::InvalidStroke("width must be positive"));
            }
        }
        if let Some(c) = &color {
            if c.chars().count() > MAX_STROKE_COLOR_LENGTH {
                return Err(ValueObjectError::InvalidStroke("color is too long"));
            }
        }
        Ok(Self {
            kind,
            point,
            color,
            width,
        })
    }
}

/// チャットメッセージ 1 件
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub display_name: DisplayName,
    pub text: MessageText,
    pub color: ParticipantColor,
    pub sent_at: Timestamp,
}

/// ルームごとの履歴上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub strokes: usize,
    pub messages: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            strokes: 20_000,
            messages: 1_000,
        }
    }
}

/// 会議ルーム
///
/// 参加者の挿入順が表示・ブロードキャスト順になる。
/// 参加者が 0 人になったルームは Repository によって破棄される。
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    participants: Vec<Participant>,
    whiteboard: History<StrokeEvent>,
    chat: History<ChatMessage>,
    closed: bool,
}

impl Room {
    /// 新しい空のルームを作成
    pub fn new(id: RoomId, created_at: Timestamp, limits: HistoryLimits) -> Self {
        Self {
            id,
            created_at,
            participants: Vec::new(),
            whiteboard: History::with_capacity(limits.strokes),
            chat: History::with_capacity(limits.messages),
            closed: false,
        }
    }

    /// 参加者を末尾に追加する
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), DomainError> {
        if self.participant(&participant.channel_id).is_some() {
            return Err(DomainError::DuplicateChannel(participant.channel_id));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// 参加者を削除する（残りの参加者の相対順序は保たれる）
    pub fn remove_participant(&mut self, channel_id: &ChannelId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.channel_id == channel_id)?;
        Some(self.participants.remove(index))
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, channel_id: &ChannelId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.channel_id == channel_id)
    }

    pub fn participant_mut(&mut self, channel_id: &ChannelId) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| &p.channel_id == channel_id)
    }

    pub fn find_by_peer_id(&self, peer_id: &PeerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.peer_id == peer_id)
    }

    /// 既定のホワイトボード権限保持者（挿入順で最初の特権ロール参加者）
    pub fn elevated_participant(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role.is_elevated())
    }

    /// 全参加者のチャンネル ID
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.participants
            .iter()
            .map(|p| p.channel_id.clone())
            .collect()
    }

    /// 指定チャンネル以外の参加者のチャンネル ID
    pub fn channel_ids_except(&self, exclude: &ChannelId) -> Vec<ChannelId> {
        self.participants
            .iter()
            .filter(|p| &p.channel_id != exclude)
            .map(|p| p.channel_id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn whiteboard(&self) -> &History<StrokeEvent> {
        &self.whiteboard
    }

    pub fn whiteboard_mut(&mut self) -> &mut History<StrokeEvent> {
        &mut self.whiteboard
    }

    pub fn chat(&self) -> &History<ChatMessage> {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut History<ChatMessage> {
        &mut self.chat
    }

    /// ルームを破棄済みにする（以降の参加はできない）
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{channel, participant, room};
    use super::*;

    #[test]
    fn test_add_participant_keeps_insertion_order() {
        // テスト項目: 参加者は追加した順序で保持される
        // given (前提条件):
        let mut room = room("r1");

        // when (操作):
        room.add_participant(participant("charlie", Role::User, false))
            .unwrap();
        room.add_participant(participant("alice", Role::Admin, true))
            .unwrap();

        // then (期待する結果):
        let ids: Vec<&str> = room.participants().iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["charlie", "alice"]);
    }

    #[test]
    fn test_add_participant_rejects_duplicate_channel() {
        // テスト項目: 同じチャンネルの参加者は二重に追加できない
        // given (前提条件):
        let mut room = room("r1");
        room.add_participant(participant("alice", Role::User, false))
            .unwrap();

        // when (操作):
        let result = room.add_participant(participant("alice", Role::User, false));

        // then (期待する結果):
        assert_eq!(result, Err(DomainError::DuplicateChannel(channel("alice"))));
        assert_eq!(room.participants().len(), 1);
    }

    #[test]
    fn test_remove_participant_preserves_relative_order() {
        // テスト項目: 削除後も残りの参加者の相対順序が保たれる
        // given (前提条件):
        let mut room = room("r1");
        for user in ["alice", "bob", "charlie"] {
            room.add_participant(participant(user, Role::User, false))
                .unwrap();
        }

        // when (操作):
        let removed = room.remove_participant(&channel("bob"));

        // then (期待する結果):
        assert_eq!(removed.unwrap().user_id.as_str(), "bob");
        let ids: Vec<&str> = room.participants().iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "charlie"]);
    }

    #[test]
    fn test_remove_unknown_participant_returns_none() {
        // テスト項目: 存在しない参加者の削除は None を返す（冪等）
        // given (前提条件):
        let mut room = room("r1");

        // when (操作):
        let removed = room.remove_participant(&channel("ghost"));

        // then (期待する結果):
        assert!(removed.is_none());
    }

    #[test]
    fn test_find_by_peer_id() {
        // テスト項目: 直接接続 ID で参加者を検索できる
        // given (前提条件):
        let mut room = room("r1");
        room.add_participant(participant("alice", Role::User, false))
            .unwrap();

        // when (操作):
        let found = room.find_by_peer_id(&PeerId::new("peer-alice".to_string()).unwrap());

        // then (期待する結果):
        assert_eq!(found.unwrap().user_id.as_str(), "alice");
    }

    #[test]
    fn test_stroke_requires_position_for_begin_and_draw() {
        // テスト項目: begin / draw は座標が必須、end は座標なしでよい
        // given (前提条件):

        // when (操作):
        let begin = StrokeEvent::new(StrokeKind::Begin, None, None, None);
        let end = StrokeEvent::new(StrokeKind::End, None, None, None);

        // then (期待する結果):
        assert_eq!(
            begin,
            Err(ValueObjectError::InvalidStroke("missing position"))
        );
        assert!(end.is_ok());
    }

    #[test]
    fn test_stroke_rejects_non_finite_values() {
        // テスト項目: 非有限な座標・線幅は拒否される
        // given (前提条件):
        let bad_point = Point {
            x: f64::NAN,
            y: 0.0,
        };
        let good_point = Point { x: 1.0, y: 2.0 };

        // when (操作):
        let nan_point = StrokeEvent::new(StrokeKind::Draw, Some(bad_point), None, None);
        let zero_width = StrokeEvent::new(StrokeKind::Draw, Some(good_point), None, Some(0.0));

        // then (期待する結果):
        assert!(nan_point.is_err());
        assert!(zero_width.is_err());
    }

    #[test]
    fn test_role_parsing() {
        // テスト項目: ロール文字列の変換と特権判定
        // given (前提条件):

        // when (操作):
        let admin: Role = "admin".parse().unwrap();
        let manager: Role = "manager".parse().unwrap();
        let unknown = "root".parse::<Role>();

        // then (期待する結果):
        assert!(admin.is_elevated());
        assert!(!manager.is_elevated());
        assert_eq!(unknown, Err(ValueObjectError::UnknownRole("root".to_string())));
    }
}
