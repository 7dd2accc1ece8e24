use crate::value_objects::{RoomId, RoomName, Timestamp};

/// 命名频道，按名称唯一，创建后不会被删除。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, name: RoomName, created_at: Timestamp) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }
}
