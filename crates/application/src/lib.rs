//! 应用层实现。
//!
//! 提供围绕领域模型的用例服务（消息入口、房间、用户），以及实时核心：
//! 房间成员注册表、扇出通道和连接会话。对存储、密码哈希、身份校验的依赖
//! 都通过 trait 抽象，由基础设施层或 Web 层注入。

pub mod clock;
pub mod dto;
pub mod error;
pub mod fanout;
pub mod identity;
pub mod password;
pub mod protocol;
pub mod registry;
pub mod repository;
pub mod services;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use dto::{MessageDto, RoomDto, TokenDto, UserDto};
pub use error::ApplicationError;
pub use fanout::{FanoutChannel, FanoutReport, PushReceiver};
pub use identity::{CredentialVerifier, Identity};
pub use password::{PasswordHasher, PasswordHasherError};
pub use protocol::{ClientEvent, ErrorPayload, ServerEvent};
pub use registry::MembershipRegistry;
pub use repository::{MessageRepository, RoomRepository, UserRepository};
pub use services::{
    MessageService, MessageServiceDependencies, RoomService, RoomServiceDependencies, UserService,
    UserServiceDependencies,
};
pub use session::RealtimeSession;
