use application::{ClientEvent, ServerEvent};
use domain::{MessageScope, RoomId};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

use crate::{error::ClientError, subscription::SubscriptionManager};

/// 客户端会话唯一的实时连接
pub struct LiveConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LiveConnection {
    /// 建立连接并推进订阅状态；本地已有选中房间时立即补发入房事件。
    pub async fn connect(url: &str, manager: &mut SubscriptionManager) -> Result<Self, ClientError> {
        manager.begin_connect();
        let stream = match connect_async(url).await {
            Ok((stream, _)) => stream,
            Err(err) => {
                manager.disconnected();
                return Err(err.into());
            }
        };

        let mut connection = Self { stream };
        announce_selection(&mut connection.stream, manager).await?;
        tracing::debug!(%url, "live connection established");
        Ok(connection)
    }

    async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        send_event(&mut self.stream, event).await
    }

    /// 在同一连接上切换房间：先发出入房事件，再更新本地选中状态。
    pub async fn switch_room(
        &mut self,
        manager: &mut SubscriptionManager,
        room_id: RoomId,
    ) -> Result<(), ClientError> {
        let intent = manager.join_intent(room_id);
        self.send(&intent).await?;
        manager.commit_selection(MessageScope::Room(room_id));
        Ok(())
    }

    /// 下一条服务端事件，跳过控制帧；连接关闭时返回 `None`
    pub async fn next_push(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                WsMessage::Text(text) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                WsMessage::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    pub async fn close(mut self, manager: &mut SubscriptionManager) -> Result<(), ClientError> {
        manager.disconnected();
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

async fn send_event<S>(sink: &mut S, event: &ClientEvent) -> Result<(), ClientError>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let payload = serde_json::to_string(event)?;
    sink.send(WsMessage::Text(payload.into())).await?;
    Ok(())
}

/// 连接建立后补发本地已选中的房间；发送失败时订阅状态退回断开。
async fn announce_selection<S>(
    sink: &mut S,
    manager: &mut SubscriptionManager,
) -> Result<(), ClientError>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let Some(event) = manager.connected() else {
        return Ok(());
    };
    if let Err(err) = send_event(sink, &event).await {
        manager.disconnected();
        return Err(err);
    }
    Ok(())
}
