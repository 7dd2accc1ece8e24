use std::ops::ControlFlow;
use std::sync::Arc;

use application::{ClientEvent, ErrorPayload, FanoutChannel, RealtimeSession, ServerEvent};
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};

type WsSender = SplitSink<WebSocket, WsMessage>;

/// WebSocket 连接管理器
///
/// 持有一个实时会话：把扇出队列里的推送写到 socket，
/// 处理客户端的 `room:join` 与心跳。循环结束时会话随之销毁，成员关系自动释放。
pub struct WebSocketConnection {
    socket: WebSocket,
    session: RealtimeSession,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, fanout: Arc<FanoutChannel>) -> Self {
        let session = RealtimeSession::open(fanout);
        tracing::info!(connection_id = %session.id(), "WebSocket 连接已建立");
        Self { socket, session }
    }

    /// 运行 WebSocket 连接的主循环，直到任意一端关闭
    pub async fn run(self) {
        let Self {
            socket,
            mut session,
        } = self;
        let (mut sender, mut incoming) = socket.split();

        loop {
            tokio::select! {
                push = session.recv() => {
                    let Some(event) = push else { break };
                    if send_event(&mut sender, &event).await.is_err() {
                        tracing::debug!(connection_id = %session.id(), "failed to write push, closing");
                        break;
                    }
                }
                frame = incoming.next() => {
                    let Some(Ok(frame)) = frame else { break };
                    if handle_incoming(&session, &mut sender, frame).await.is_break() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            connection_id = %session.id(),
            room_id = ?session.current_room(),
            "WebSocket 连接已断开"
        );

        // 先释放成员关系，再关闭传输层
        drop(session);
        let _ = sender.close().await;
    }
}

async fn send_event(sender: &mut WsSender, event: &ServerEvent) -> Result<(), axum::Error> {
    let payload = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize websocket payload");
            return Ok(());
        }
    };
    sender.send(WsMessage::Text(payload.into())).await
}

/// 处理来自客户端的帧
async fn handle_incoming(
    session: &RealtimeSession,
    sender: &mut WsSender,
    frame: WsMessage,
) -> ControlFlow<()> {
    let reply = match frame {
        WsMessage::Close(_) => return ControlFlow::Break(()),
        WsMessage::Ping(data) => {
            return match sender.send(WsMessage::Pong(data)).await {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            };
        }
        WsMessage::Pong(_) | WsMessage::Binary(_) => return ControlFlow::Continue(()),
        WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(ClientEvent::RoomJoin(room_id)) => match session.join(&room_id) {
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(connection_id = %session.id(), error = %err, "room join rejected");
                    Some(ErrorPayload::new("INVALID_ROOM", err.to_string()))
                }
            },
            Err(err) => {
                tracing::debug!(connection_id = %session.id(), error = %err, "unrecognised client event");
                Some(ErrorPayload::new("INVALID_EVENT", "unrecognised event"))
            }
        },
    };

    match reply {
        Some(payload) => match send_event(sender, &ServerEvent::Error(payload)).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        },
        None => ControlFlow::Continue(()),
    }
}
