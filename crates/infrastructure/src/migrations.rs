use sqlx::migrate::Migrator;

/// 随二进制一起打包的数据库迁移
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
