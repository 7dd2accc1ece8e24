use std::sync::Arc;

use domain::{Room, RoomId, RoomName};

use crate::{clock::Clock, error::ApplicationError, repository::RoomRepository};

pub struct RoomServiceDependencies {
    pub room_repository: Arc<dyn RoomRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct RoomService {
    deps: RoomServiceDependencies,
}

impl RoomService {
    pub fn new(deps: RoomServiceDependencies) -> Self {
        Self { deps }
    }

    /// 按名称创建房间；同名房间已存在时返回已有房间。
    pub async fn create_room(&self, name: &str) -> Result<Room, ApplicationError> {
        let name = RoomName::parse(name)?;

        if let Some(existing) = self.deps.room_repository.find_by_name(name.as_str()).await? {
            return Ok(existing);
        }

        // 并发创建同名房间时由存储层的 upsert 兜底
        let room = Room::new(RoomId::generate(), name, self.deps.clock.now());
        let stored = self.deps.room_repository.upsert(room).await?;
        tracing::info!(room_id = %stored.id, name = %stored.name, "room created");
        Ok(stored)
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, ApplicationError> {
        Ok(self.deps.room_repository.list().await?)
    }

    pub async fn find_room(&self, id: RoomId) -> Result<Option<Room>, ApplicationError> {
        Ok(self.deps.room_repository.find_by_id(id).await?)
    }

    /// 启动时确保默认房间存在
    pub async fn ensure_room(&self, name: &str) -> Result<Room, ApplicationError> {
        let room = self.create_room(name).await?;
        tracing::info!(room_id = %room.id, name = %room.name, "default room ready");
        Ok(room)
    }
}
