//! 统一配置中心
//!
//! 加载顺序：编译期默认值 -> 可选 YAML 文件 -> 环境变量，后者覆盖前者。
//! - 数据库连接（未配置时使用进程内存储）
//! - JWT 认证
//! - 实时推送
//! - 服务监听

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 默认读取的配置文件，可用 `CHATROOM_CONFIG` 指定其他路径
pub const DEFAULT_CONFIG_FILE: &str = "chatroom.yaml";

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub realtime: RealtimeConfig,
    /// 启动时确保存在的默认房间
    pub default_room: String,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 为空时使用进程内存储
    pub url: Option<String>,
    pub max_connections: u32,
}

/// JWT配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// 每个连接的推送队列长度
    pub connection_buffer: usize,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub bcrypt_cost: Option<u32>,
}

impl Default for AppConfig {
    /// 开发环境默认值，生产环境需要通过环境变量覆盖 JWT 密钥
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
                bcrypt_cost: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "dev-secret-key-not-for-production-use".to_string(),
                expiration_hours: 1,
            },
            realtime: RealtimeConfig {
                connection_buffer: 64,
            },
            default_room: "General".to_string(),
        }
    }
}

/// 扁平环境变量名到配置路径的映射
fn env_key(key: &str) -> Option<&'static str> {
    let path = match key.to_ascii_uppercase().as_str() {
        "DATABASE_URL" => "database.url",
        "DB_MAX_CONNECTIONS" => "database.max_connections",
        "JWT_SECRET" => "jwt.secret",
        "JWT_EXPIRATION_HOURS" => "jwt.expiration_hours",
        "SERVER_HOST" => "server.host",
        "SERVER_PORT" => "server.port",
        "BCRYPT_COST" => "server.bcrypt_cost",
        "CONNECTION_BUFFER" => "realtime.connection_buffer",
        "DEFAULT_ROOM" => "default_room",
        _ => return None,
    };
    Some(path)
}

impl AppConfig {
    /// 组装配置来源，不做提取。`API_PORT` 是 `SERVER_PORT` 的别名，两者同时存在时后者优先。
    pub fn figment() -> Figment {
        let file = std::env::var("CHATROOM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(file))
            .merge(Env::raw().only(&["API_PORT"]).map(|_| "server.port".into()))
            .merge(Env::raw().filter_map(|key| env_key(key.as_str()).map(Into::into)))
    }

    /// 加载并校验配置
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment().extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// 空白的数据库地址视为未配置
    pub fn database_url(&self) -> Option<&str> {
        self.database
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 至少256位/32字节
        if self.jwt.secret.len() < 32 {
            return Err(ConfigError::InvalidJwtSecret(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::InvalidJwtSecret(
                "JWT expiration must be a positive number of hours".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerPort(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidDatabaseConfig(
                "Max connections must be greater than 0".to_string(),
            ));
        }

        if self.realtime.connection_buffer == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "connection buffer must be greater than 0".to_string(),
            ));
        }

        if let Some(cost) = self.server.bcrypt_cost {
            if !(4..=31).contains(&cost) {
                return Err(ConfigError::InvalidServerConfig(
                    "bcrypt cost must be between 4 and 31".to_string(),
                ));
            }
        }

        if self.default_room.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "default room name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid JWT configuration: {0}")]
    InvalidJwtSecret(String),
    #[error("Invalid server port: {0}")]
    InvalidServerPort(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Failed to load configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn extract() -> figment::Result<AppConfig> {
        AppConfig::figment().extract()
    }

    #[test]
    fn defaults_are_valid() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = extract()?;
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.jwt.expiration_hours, 1);
            assert_eq!(config.default_room, "General");
            assert!(config.database_url().is_none());
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn flat_env_vars_override_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DATABASE_URL", "postgres://user:pass@db:5432/chat");
            jail.set_env("DB_MAX_CONNECTIONS", "12");
            jail.set_env("JWT_EXPIRATION_HOURS", "6");
            jail.set_env("SERVER_HOST", "0.0.0.0");
            jail.set_env("BCRYPT_COST", "4");
            jail.set_env("CONNECTION_BUFFER", "8");
            jail.set_env("DEFAULT_ROOM", "Lobby");

            let config = extract()?;
            assert_eq!(config.database_url(), Some("postgres://user:pass@db:5432/chat"));
            assert_eq!(config.database.max_connections, 12);
            assert_eq!(config.jwt.expiration_hours, 6);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.bcrypt_cost, Some(4));
            assert_eq!(config.realtime.connection_buffer, 8);
            assert_eq!(config.default_room, "Lobby");
            Ok(())
        });
    }

    #[test]
    fn api_port_is_an_alias_that_server_port_overrides() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("API_PORT", "5000");
            assert_eq!(extract()?.server.port, 5000);

            jail.set_env("SERVER_PORT", "6000");
            assert_eq!(extract()?.server.port, 6000);
            Ok(())
        });
    }

    #[test]
    fn yaml_file_sits_between_defaults_and_env() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                "server:\n  port: 4100\ndefault_room: Lounge\n",
            )?;
            let config = extract()?;
            assert_eq!(config.server.port, 4100);
            assert_eq!(config.default_room, "Lounge");

            jail.set_env("SERVER_PORT", "4200");
            assert_eq!(extract()?.server.port, 4200);
            Ok(())
        });
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let mut config = AppConfig::default();
        config.database.url = Some("   ".into());
        assert!(config.database_url().is_none());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.jwt.secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtSecret(_))));

        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidServerPort(_))));

        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.realtime.connection_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.bcrypt_cost = Some(3);
        assert!(config.validate().is_err());
        config.server.bcrypt_cost = Some(32);
        assert!(config.validate().is_err());
        config.server.bcrypt_cost = Some(12);
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.default_room = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
