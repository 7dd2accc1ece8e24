use crate::value_objects::{AuthorName, MessageId, MessageText, RoomId, Timestamp};

/// 消息的归属范围。
///
/// `Global` 是没有房间引用的旧版消息，推送给所有在线连接；
/// 序列化时与 `Option<RoomId>` 互换，`null` 即 `Global`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "Option<RoomId>", into = "Option<RoomId>")]
pub enum MessageScope {
    Room(RoomId),
    Global,
}

impl MessageScope {
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Self::Room(room_id) => Some(*room_id),
            Self::Global => None,
        }
    }
}

impl From<Option<RoomId>> for MessageScope {
    fn from(value: Option<RoomId>) -> Self {
        value.map_or(Self::Global, Self::Room)
    }
}

impl From<MessageScope> for Option<RoomId> {
    fn from(value: MessageScope) -> Self {
        value.room_id()
    }
}

/// 追加写入的聊天消息，创建后不可编辑或删除。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: MessageText,
    pub author: AuthorName,
    pub scope: MessageScope,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        text: MessageText,
        author: AuthorName,
        scope: MessageScope,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            text,
            author,
            scope,
            created_at,
        }
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.scope.room_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn scope_serializes_as_nullable_room_id() {
        let room_id = RoomId::from(Uuid::new_v4());

        let json = serde_json::to_value(MessageScope::Room(room_id)).unwrap();
        assert_eq!(json, serde_json::json!(room_id.to_string()));

        let json = serde_json::to_value(MessageScope::Global).unwrap();
        assert!(json.is_null());

        let parsed: MessageScope = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert_eq!(parsed, MessageScope::Global);
    }
}
