use std::sync::Arc;

use domain::{ConnectionId, DomainError, RoomId};

use crate::{
    fanout::{FanoutChannel, PushReceiver},
    protocol::ServerEvent,
    registry::MembershipRegistry,
};

/// 单个实时连接的生命周期句柄。
///
/// 打开时在扇出通道登记推送队列；`Drop` 时释放成员关系并摘除队列，
/// 每个连接恰好执行一次，不依赖调用方记得清理。
pub struct RealtimeSession {
    id: ConnectionId,
    registry: Arc<MembershipRegistry>,
    fanout: Arc<FanoutChannel>,
    pushes: PushReceiver,
}

impl RealtimeSession {
    pub fn open(fanout: Arc<FanoutChannel>) -> Self {
        let id = ConnectionId::generate();
        let registry = fanout.registry().clone();
        let pushes = fanout.attach(id);
        tracing::debug!(connection_id = %id, "realtime session opened");
        Self {
            id,
            registry,
            fanout,
            pushes,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn current_room(&self) -> Option<RoomId> {
        self.registry.room_of(self.id)
    }

    /// 处理客户端的 `room:join`，切换到新房间并离开之前的房间。
    pub fn join(&self, raw_room_id: &str) -> Result<RoomId, DomainError> {
        let room_id = self.registry.join_raw(self.id, raw_room_id)?;
        tracing::info!(connection_id = %self.id, room_id = %room_id, "connection joined room");
        Ok(room_id)
    }

    /// 等待下一条推送；通道被摘除后返回 `None`。
    pub async fn recv(&mut self) -> Option<Arc<ServerEvent>> {
        self.pushes.recv().await
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        let room_id = self.registry.leave(self.id);
        self.fanout.detach(self.id);
        tracing::debug!(connection_id = %self.id, room_id = ?room_id, "realtime session closed");
    }
}
