use std::sync::Arc;

use application::{MessageRepository, RoomRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    AuthorName, Message, MessageId, MessageScope, MessageText, PasswordHash, RepositoryError,
    Room, RoomId, RoomName, User, UserId, Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username = Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User::register(
            UserId::from(value.id),
            username,
            password,
            value.created_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoomRecord> for Room {
    type Error = RepositoryError;

    fn try_from(value: RoomRecord) -> Result<Self, Self::Error> {
        let name = RoomName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Room::new(RoomId::from(value.id), name, value.created_at))
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    text: String,
    author: String,
    room_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let text = MessageText::new(value.text).map_err(|err| invalid_data(err.to_string()))?;
        let author = AuthorName::new(value.author).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Message::new(
            MessageId::from(value.id),
            text,
            author,
            MessageScope::from(value.room_id.map(RoomId::from)),
            value.created_at,
        ))
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(user.password.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, password_hash, created_at FROM users WHERE username = $1"#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, name, created_at FROM rooms WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Room::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Room>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, name, created_at FROM rooms WHERE name = $1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Room::try_from).transpose()
    }

    async fn upsert(&self, room: Room) -> Result<Room, RepositoryError> {
        // 冲突时做一次空更新，让 RETURNING 带回已有的行
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            INSERT INTO rooms (id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::from(room.id))
        .bind(room.name.as_str())
        .bind(room.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Room::try_from(record)
    }

    async fn list(&self) -> Result<Vec<Room>, RepositoryError> {
        let records = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, name, created_at FROM rooms ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Room::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, text, author, room_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, text, author, room_id, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.text.as_str())
        .bind(message.author.as_str())
        .bind(message.room_id().map(Uuid::from))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn list_by_scope(&self, scope: MessageScope) -> Result<Vec<Message>, RepositoryError> {
        let records = match scope {
            MessageScope::Room(room_id) => {
                sqlx::query_as::<_, MessageRecord>(
                    r#"SELECT id, text, author, room_id, created_at
                    FROM messages
                    WHERE room_id = $1
                    ORDER BY created_at DESC"#,
                )
                .bind(Uuid::from(room_id))
                .fetch_all(&self.pool)
                .await
            }
            MessageScope::Global => {
                sqlx::query_as::<_, MessageRecord>(
                    r#"SELECT id, text, author, room_id, created_at
                    FROM messages
                    WHERE room_id IS NULL
                    ORDER BY created_at DESC"#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub room_repository: Arc<PgRoomRepository>,
    pub message_repository: Arc<PgMessageRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            room_repository: Arc::new(PgRoomRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
