//! 基础设施层实现。
//!
//! 提供 Postgres 与进程内两套仓储、bcrypt 密码哈希，实现应用层定义的接口。

pub mod builder;
pub mod memory;
pub mod migrations;
pub mod password;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError, StorageBackend};
pub use memory::{
    InMemoryMessageRepository, InMemoryRoomRepository, InMemoryStorage, InMemoryUserRepository,
};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgMessageRepository, PgRoomRepository, PgStorage, PgUserRepository,
};
