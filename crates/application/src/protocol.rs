//! WebSocket 线上事件
//!
//! 文本帧承载 JSON 信封 `{"event": <名称>, "data": <负载>}`。

use serde::{Deserialize, Serialize};

use crate::dto::MessageDto;

/// 客户端 -> 服务端
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// 切换当前连接所在房间
    #[serde(rename = "room:join")]
    RoomJoin(String),
}

/// 服务端 -> 客户端
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:new")]
    MessageNew(MessageDto),
    /// 入房请求被拒绝等连接级错误
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
