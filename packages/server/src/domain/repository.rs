//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::{
    entity::{Role, Room},
    error::{DirectoryError, RepositoryError},
    value_object::{ChannelId, RoomId, Timestamp, UserId},
};

/// ロック済みのルーム
///
/// ガードを保持している間、同じルームへの他のイベント処理は待機する。
/// 他のルームの処理はブロックされない。
pub type RoomGuard = OwnedMutexGuard<Room>;

/// Room Repository trait
///
/// ルームごとの排他制御を提供します。UseCase 層はこの trait に依存し、
/// Infrastructure 層の具体的な実装には依存しません。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームをロックして返す（存在しなければ空のルームを作成）
    async fn open_room(&self, room_id: &RoomId) -> Result<RoomGuard, RepositoryError>;

    /// 既存のルームをロックして返す
    async fn lock_room(&self, room_id: &RoomId) -> Result<RoomGuard, RepositoryError>;

    /// 参加者が 0 人ならルームを破棄する（履歴も破棄される）
    ///
    /// 破棄した場合は `true` を返す。
    async fn close_if_empty(&self, guard: RoomGuard) -> bool;

    /// ルームのスナップショットを取得
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 全ルームのスナップショットを取得
    async fn list_rooms(&self) -> Vec<Room>;
}

/// アイデンティティごとのセッション記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub room_id: RoomId,
    pub channel_id: ChannelId,
    pub bound_at: Timestamp,
}

/// Session Record の保存先
///
/// アカウントストアのセッションフィールドに相当する。
/// 読み込み・更新・削除の組み合わせは Session Registry がキー単位で直列化する。
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Option<SessionRecord>, RepositoryError>;

    async fn save(&self, user_id: &UserId, record: SessionRecord) -> Result<(), RepositoryError>;

    async fn clear(&self, user_id: &UserId) -> Result<(), RepositoryError>;
}

/// ユーザーのロール参照（アカウントストア）
///
/// アカウントが見つからない場合は `Ok(None)` を返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_role(&self, user_id: &UserId) -> Result<Option<Role>, DirectoryError>;
}
