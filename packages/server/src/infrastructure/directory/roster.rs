//! Roster-backed UserDirectory 実装
//!
//! 起動時に読み込んだ `{ "<userId>": "admin" | "manager" | "user" }` 形式の
//! JSON をアカウントストアの代わりに使用します。

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;

use crate::domain::{DirectoryError, Role, UserDirectory, UserId};

/// ロール表を保持する UserDirectory
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    roles: HashMap<UserId, Role>,
}

impl InMemoryUserDirectory {
    pub fn new(roles: HashMap<UserId, Role>) -> Self {
        Self { roles }
    }

    /// JSON 文字列からロール表を読み込む
    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let raw: HashMap<String, Role> = serde_json::from_str(json)
            .map_err(|e| DirectoryError::InvalidRoster(e.to_string()))?;

        let roles = raw
            .into_iter()
            .map(|(user, role)| {
                UserId::new(user)
                    .map(|id| (id, role))
                    .map_err(|e| DirectoryError::InvalidRoster(e.to_string()))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self::new(roles))
    }

    /// JSON ファイルからロール表を読み込む
    pub fn from_json_file(path: &Path) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DirectoryError::InvalidRoster(format!("{}: {}", path.display(), e)))?;
        let directory = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            users = directory.roles.len(),
            "User roster loaded"
        );
        Ok(directory)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_role(&self, user_id: &UserId) -> Result<Option<Role>, DirectoryError> {
        Ok(self.roles.get(user_id).copied())
    }
}
