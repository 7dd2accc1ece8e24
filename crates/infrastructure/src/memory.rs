//! 进程内存储
//!
//! 未配置数据库时使用，进程退出即丢失。语义与 Postgres 实现保持一致：
//! 用户名和房间名唯一，房间按创建时间升序，消息按创建时间倒序。

use std::collections::HashMap;
use std::sync::Arc;

use application::{MessageRepository, RoomRepository, UserRepository};
use async_trait::async_trait;
use domain::{Message, MessageScope, RepositoryError, Room, RoomId, User, Username};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.users.write().await;
        let id = Uuid::from(user.id);
        if guard.contains_key(&id) || guard.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.read().await;
        Ok(guard.values().find(|u| &u.username == username).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryRoomRepository {
    // 插入顺序即创建顺序
    rooms: RwLock<Vec<Room>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let guard = self.rooms.read().await;
        Ok(guard.iter().find(|room| room.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Room>, RepositoryError> {
        let guard = self.rooms.read().await;
        Ok(guard.iter().find(|room| room.name.as_str() == name).cloned())
    }

    async fn upsert(&self, room: Room) -> Result<Room, RepositoryError> {
        let mut guard = self.rooms.write().await;
        if let Some(existing) = guard.iter().find(|existing| existing.name == room.name) {
            return Ok(existing.clone());
        }
        guard.push(room.clone());
        Ok(room)
    }

    async fn list(&self) -> Result<Vec<Room>, RepositoryError> {
        let mut rooms = self.rooms.read().await.clone();
        rooms.sort_by_key(|room| room.created_at);
        Ok(rooms)
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut guard = self.messages.write().await;
        if guard.iter().any(|existing| existing.id == message.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(message.clone());
        Ok(message)
    }

    async fn list_by_scope(&self, scope: MessageScope) -> Result<Vec<Message>, RepositoryError> {
        let guard = self.messages.read().await;
        // 倒序遍历后做稳定排序，时间相同的按写入顺序后写在前
        let mut found: Vec<Message> = guard
            .iter()
            .rev()
            .filter(|message| message.scope == scope)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    pub user_repository: Arc<InMemoryUserRepository>,
    pub room_repository: Arc<InMemoryRoomRepository>,
    pub message_repository: Arc<InMemoryMessageRepository>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}
