use async_trait::async_trait;
use domain::{Message, MessageScope, RepositoryError, Room, RoomId, User, Username};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 用户名重复时返回 `RepositoryError::Conflict`
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Room>, RepositoryError>;

    /// 按名称 upsert：同名房间已存在时原样返回已有记录，不会新建。
    async fn upsert(&self, room: Room) -> Result<Room, RepositoryError>;

    /// 按创建时间升序
    async fn list(&self) -> Result<Vec<Room>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 返回持久化后的完整记录
    async fn create(&self, message: Message) -> Result<Message, RepositoryError>;

    // 按创建时间倒序；Global 只返回没有房间引用的旧消息
    async fn list_by_scope(&self, scope: MessageScope) -> Result<Vec<Message>, RepositoryError>;
}
