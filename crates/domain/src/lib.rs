//! 聊天室系统核心领域模型
//!
//! 包含用户、房间、消息等实体及其值对象，以及领域和存储错误。

pub mod errors;
pub mod message;
pub mod room;
pub mod user;
pub mod value_objects;

pub use errors::*;
pub use message::{Message, MessageScope};
pub use room::Room;
pub use user::User;
pub use value_objects::*;
