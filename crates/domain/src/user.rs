use crate::value_objects::{PasswordHash, Timestamp, UserId, Username};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub created_at: Timestamp,
}

impl User {
    /// 注册后用户不可变。
    pub fn register(id: UserId, username: Username, password: PasswordHash, now: Timestamp) -> Self {
        Self {
            id,
            username,
            password,
            created_at: now,
        }
    }
}
