use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 服务端返回的非 2xx 响应
    #[error("request failed with {status}: {code} {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed payload: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("live connection is closed")]
    Closed,
}
