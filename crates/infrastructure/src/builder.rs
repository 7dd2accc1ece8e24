use std::sync::Arc;

use application::{MessageRepository, PasswordHasher, RoomRepository, UserRepository};
use config::AppConfig;
use thiserror::Error;

use crate::{
    memory::InMemoryStorage,
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Clone, Default)]
pub struct InfrastructureConfig {
    /// 为空时使用进程内存储
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub bcrypt_cost: Option<u32>,
}

impl From<&AppConfig> for InfrastructureConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            database_url: config.database_url().map(str::to_owned),
            max_connections: config.database.max_connections,
            bcrypt_cost: config.server.bcrypt_cost,
        }
    }
}

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    InMemory,
}

/// 装配好的存储与密码哈希适配器
#[derive(Clone)]
pub struct Infrastructure {
    pub backend: StorageBackend,
    pub user_repository: Arc<dyn UserRepository>,
    pub room_repository: Arc<dyn RoomRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
}

impl Infrastructure {
    /// 配置了数据库地址时连接 Postgres 并执行迁移，否则退回进程内存储。
    pub async fn connect(config: InfrastructureConfig) -> Result<Self, InfrastructureError> {
        let Some(database_url) = config.database_url.as_deref() else {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            return Ok(Self::in_memory(config.bcrypt_cost));
        };

        let pool = create_pg_pool(database_url, config.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!(max_connections = config.max_connections, "connected to postgres");

        let storage = PgStorage::new(pool);
        Ok(Self {
            backend: StorageBackend::Postgres,
            user_repository: storage.user_repository,
            room_repository: storage.room_repository,
            message_repository: storage.message_repository,
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
        })
    }

    pub fn in_memory(bcrypt_cost: Option<u32>) -> Self {
        let storage = InMemoryStorage::new();
        Self {
            backend: StorageBackend::InMemory,
            user_repository: storage.user_repository,
            room_repository: storage.room_repository,
            message_repository: storage.message_repository,
            password_hasher: Arc::new(BcryptPasswordHasher::new(bcrypt_cost)),
        }
    }
}
