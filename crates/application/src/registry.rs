//! 房间成员注册表
//!
//! 记录每个实时连接当前选中的房间，一个连接同一时刻最多属于一个房间。
//! 注册表是成员关系的唯一写入方；扇出通道只读取。

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use domain::{ConnectionId, DomainError, RoomId};

#[derive(Debug, Default)]
struct Memberships {
    by_connection: HashMap<ConnectionId, RoomId>,
    by_room: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl Memberships {
    fn detach(&mut self, connection_id: ConnectionId) -> Option<RoomId> {
        let room_id = self.by_connection.remove(&connection_id)?;
        if let Some(members) = self.by_room.get_mut(&room_id) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.by_room.remove(&room_id);
            }
        }
        Some(room_id)
    }
}

/// 连接 -> 房间 的内存映射。
///
/// 所有操作只在单个互斥锁内完成映射读写，不在锁内做任何 I/O，
/// 扇出时拿到的是调用瞬间的快照。
#[derive(Debug, Default)]
pub struct MembershipRegistry {
    inner: Mutex<Memberships>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Memberships> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 让连接只属于 `room_id`，原子地移除它之前的房间。返回之前的房间。
    pub fn join(&self, connection_id: ConnectionId, room_id: RoomId) -> Option<RoomId> {
        let mut memberships = self.lock();
        let previous = memberships.detach(connection_id);
        memberships.by_connection.insert(connection_id, room_id);
        memberships
            .by_room
            .entry(room_id)
            .or_default()
            .insert(connection_id);
        previous
    }

    /// 解析客户端传来的房间标识后加入。
    ///
    /// 空串或非法标识返回校验错误，且不改变已有成员关系。
    pub fn join_raw(
        &self,
        connection_id: ConnectionId,
        raw_room_id: &str,
    ) -> Result<RoomId, DomainError> {
        let room_id = RoomId::parse(raw_room_id)?;
        self.join(connection_id, room_id);
        Ok(room_id)
    }

    /// 连接关闭时释放其全部成员关系。
    pub fn leave(&self, connection_id: ConnectionId) -> Option<RoomId> {
        self.lock().detach(connection_id)
    }

    /// 当前选中 `room_id` 的全部连接，每次调用都读取最新状态。
    pub fn members_of(&self, room_id: RoomId) -> Vec<ConnectionId> {
        self.lock()
            .by_room
            .get(&room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_of(&self, connection_id: ConnectionId) -> Option<RoomId> {
        self.lock().by_connection.get(&connection_id).copied()
    }

    /// 已选中房间的连接数
    pub fn len(&self) -> usize {
        self.lock().by_connection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
