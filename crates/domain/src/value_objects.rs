use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = chrono::DateTime<chrono::Utc>;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// 解析外部传入的标识，空串与非法格式都视为校验错误。
            pub fn parse(value: &str) -> Result<Self, DomainError> {
                let value = value.trim();
                if value.is_empty() {
                    return Err(DomainError::invalid_argument($field, "cannot be empty"));
                }
                Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|_| DomainError::invalid_argument($field, "malformed identifier"))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

uuid_id!(
    /// 用户唯一标识。
    UserId,
    "user_id"
);
uuid_id!(
    /// 聊天室唯一标识。
    RoomId,
    "room_id"
);
uuid_id!(
    /// 消息唯一标识。
    MessageId,
    "message_id"
);
uuid_id!(
    /// 实时连接的会话标识，仅在传输层打开期间存在。
    ConnectionId,
    "connection_id"
);

fn non_blank(field: &'static str, value: String) -> Result<String, DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_argument(field, "cannot be empty"));
    }
    Ok(value)
}

/// 经过验证的用户名（唯一登录名）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = non_blank("username", value.into())?;
        Ok(Self(value.trim().to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 房间名，区分大小写，首尾空白会被去掉。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = non_blank("name", value.into())?;
        Ok(Self(value.trim().to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 消息正文内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        non_blank("text", value.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 消息上展示的作者名，自由填写，与登录用户无关。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        non_blank("author", value.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 经过外部服务生成的密码哈希。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        non_blank("password_hash", value.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_rejects_blank_and_malformed_input() {
        assert!(matches!(
            RoomId::parse("   "),
            Err(DomainError::InvalidArgument { ref reason, .. }) if reason == "cannot be empty"
        ));
        assert!(matches!(
            RoomId::parse("general"),
            Err(DomainError::InvalidArgument { ref reason, .. }) if reason == "malformed identifier"
        ));
    }

    #[test]
    fn room_id_parse_trims_whitespace() {
        let id = Uuid::new_v4();
        let parsed = RoomId::parse(&format!("  {id} ")).unwrap();
        assert_eq!(parsed, RoomId::from(id));
    }

    #[test]
    fn room_name_is_trimmed_but_keeps_case() {
        let name = RoomName::parse("  General ").unwrap();
        assert_eq!(name.as_str(), "General");
        assert_ne!(name, RoomName::parse("general").unwrap());
    }

    #[test]
    fn message_text_keeps_original_spacing() {
        let text = MessageText::new("  hi  ").unwrap();
        assert_eq!(text.as_str(), "  hi  ");
        assert!(MessageText::new(" \n\t").is_err());
        assert!(AuthorName::new("").is_err());
    }
}
