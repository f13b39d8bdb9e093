//! Value objects
//!
//! 外部から受け取った文字列を検証済みの型に変換します。
//! 生成後は不変で、ドメイン層の全ての識別子はこれらの型を通して扱います。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of identifiers supplied by clients (room, user, peer ids)
pub const MAX_ID_LENGTH: usize = 256;
/// Maximum length of a display name
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;
/// Maximum length of a chat message
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// 空白のみ・空文字列を拒否し、最大長を検証する
fn validate_text(
    field: &'static str,
    value: String,
    max_len: usize,
) -> Result<String, ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(ValueObjectError::TooLong {
            field,
            max: max_len,
            actual: len,
        });
    }
    Ok(value)
}

macro_rules! text_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_text($field, value, $max).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_value_object!(
    /// Opaque room identifier chosen by clients.
    RoomId,
    "room_id",
    MAX_ID_LENGTH
);

text_value_object!(
    /// Identity asserted by the upstream authentication collaborator.
    UserId,
    "user_id",
    MAX_ID_LENGTH
);

text_value_object!(
    /// Signaling channel identifier, one per WebSocket connection instance.
    ChannelId,
    "channel_id",
    MAX_ID_LENGTH
);

text_value_object!(
    /// Direct-connection identifier used by the peer transport to address a participant.
    PeerId,
    "peer_id",
    MAX_ID_LENGTH
);

text_value_object!(
    /// Name shown to other participants.
    DisplayName,
    "display_name",
    MAX_DISPLAY_NAME_LENGTH
);

text_value_object!(
    /// Chat message body.
    MessageText,
    "message",
    MAX_MESSAGE_LENGTH
);

/// ChannelId の生成
pub struct ChannelIdFactory;

impl ChannelIdFactory {
    /// 接続ごとに一意な ChannelId を生成する
    pub fn generate() -> ChannelId {
        ChannelId(Uuid::new_v4().to_string())
    }
}

/// Unix timestamp in milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
