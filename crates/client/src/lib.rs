//! 聊天客户端
//!
//! 维护单条实时连接和本地房间视图，REST 接口用于注册登录与历史刷新。

mod connection;
mod error;
mod rest;
mod subscription;

pub use connection::LiveConnection;
pub use error::ClientError;
pub use rest::RestClient;
pub use subscription::{Reconciled, RoomView, SubscriptionManager, SubscriptionState};
