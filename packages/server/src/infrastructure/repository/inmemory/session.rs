//! InMemory Session Store 実装
//!
//! アカウントストアのセッションフィールドの代わりにプロセス内の Map を使用します。

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{RepositoryError, SessionRecord, SessionStore, UserId};

/// インメモリ Session Store 実装
#[derive(Default)]
pub struct InMemorySessionStore {
    records: DashMap<UserId, SessionRecord>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<SessionRecord>, RepositoryError> {
        Ok(self.records.get(user_id).map(|r| r.value().clone()))
    }

    async fn save(&self, user_id: &UserId, record: SessionRecord) -> Result<(), RepositoryError> {
        self.records.insert(user_id.clone(), record);
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        self.records.remove(user_id);
        Ok(())
    }
}
