//! 对外暴露的数据传输对象，字段名与前端约定一致（camelCase）。

use chrono::{DateTime, Utc};
use domain::{Message, Room, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 完整的消息记录，同时用作 REST 响应和实时推送负载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub room_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.into(),
            text: message.text.as_str().to_owned(),
            author: message.author.as_str().to_owned(),
            room_id: message.room_id().map(Uuid::from),
            created_at: message.created_at,
        }
    }
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self::from(&message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.into(),
            name: room.name.as_str().to_owned(),
            created_at: room.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            username: user.username.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDto {
    pub token: String,
}
