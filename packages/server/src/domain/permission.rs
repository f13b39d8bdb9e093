//! Permission Arbiter
//!
//! ホワイトボード描画権限を変更する唯一の関数群です。
//! 呼び出し元（UseCase）が権限変更者の認可を済ませた上で呼び出します。

use super::{
    entity::{Role, Room},
    error::DomainError,
    value_object::ChannelId,
};

/// 1 人分の権限変更結果（クライアントへ通知される順序で並ぶ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlUpdate {
    pub target: ChannelId,
    pub has_control: bool,
}

/// 権限の付与・剥奪を適用する
///
/// 通知順序は次の通り:
///
/// 1. 対象者の更新
/// 2. 特権ロール参加者（対象者でない場合）への逆の更新
/// 3. その結果の保持者以外で、まだ権限を持っている参加者の剥奪
///
/// 付与後の保持者は対象者、剥奪後の保持者は特権ロール参加者になり、
/// 往復が完了した時点で権限保持者は高々 1 人になる。
pub fn arbitrate(
    room: &mut Room,
    target: &ChannelId,
    has_control: bool,
) -> Result<Vec<ControlUpdate>, DomainError> {
    let target_participant = room
        .participant_mut(target)
        .ok_or_else(|| DomainError::ParticipantNotFound(target.clone()))?;
    target_participant.has_whiteboard_control = has_control;

    let mut updates = vec![ControlUpdate {
        target: target.clone(),
        has_control,
    }];

    let elevated = room
        .elevated_participant()
        .map(|p| p.channel_id.clone())
        .filter(|channel| channel != target);

    if let Some(elevated) = &elevated {
        if let Some(p) = room.participant_mut(elevated) {
            p.has_whiteboard_control = !has_control;
        }
        updates.push(ControlUpdate {
            target: elevated.clone(),
            has_control: !has_control,
        });
    }

    let holder = if has_control {
        Some(target.clone())
    } else {
        elevated
    };
    let Some(holder) = holder else {
        return Ok(updates);
    };

    let stale_holders: Vec<ChannelId> = room
        .participants()
        .iter()
        .filter(|p| p.has_whiteboard_control && p.channel_id != holder)
        .map(|p| p.channel_id.clone())
        .collect();
    for channel in stale_holders {
        if let Some(p) = room.participant_mut(&channel) {
            p.has_whiteboard_control = false;
        }
        updates.push(ControlUpdate {
            target: channel,
            has_control: false,
        });
    }

    Ok(updates)
}

/// 参加時の初期権限
///
/// 特権ロールであり、かつルーム内に権限保持者がいない場合のみ付与される。
pub fn initial_control(room: &Room, role: Role) -> bool {
    role.is_elevated()
        && !room
            .participants()
            .iter()
            .any(|p| p.has_whiteboard_control)
}
