use std::sync::Arc;

use domain::{
    AuthorName, DomainError, Message, MessageId, MessageScope, MessageText, RoomId,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    fanout::FanoutChannel,
    identity::CredentialVerifier,
    repository::{MessageRepository, RoomRepository},
};

#[derive(Debug, Clone, Default)]
pub struct PostMessageRequest {
    pub text: String,
    pub author: String,
    /// 空白或缺省表示旧版全局消息
    pub room_id: Option<String>,
    /// Bearer 凭证原文
    pub credential: Option<String>,
}

pub struct MessageServiceDependencies {
    pub room_repository: Arc<dyn RoomRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub credential_verifier: Arc<dyn CredentialVerifier>,
    pub fanout: Arc<FanoutChannel>,
    pub clock: Arc<dyn Clock>,
}

/// 消息入口：校验、持久化、推送。
pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发布一条消息。
    ///
    /// 校验顺序：正文与作者非空 -> 房间存在 -> 凭证有效，任一失败都不会写库。
    /// 写库与推送之间没有事务，推送只是尽力而为。
    pub async fn post_message(
        &self,
        request: PostMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let text = MessageText::new(request.text)?;
        let author = AuthorName::new(request.author)?;

        let scope = self.resolve_scope(request.room_id.as_deref()).await?;

        let token = request
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApplicationError::Authentication)?;
        let identity = self.deps.credential_verifier.verify_credential(token)?;

        let message = Message::new(
            MessageId::generate(),
            text,
            author,
            scope,
            self.deps.clock.now(),
        );
        let stored = self.deps.message_repository.create(message).await?;

        let report = self.deps.fanout.publish(&stored);
        tracing::info!(
            message_id = %stored.id,
            room_id = ?stored.room_id(),
            poster = %identity.subject_id,
            delivered = report.delivered,
            missed = report.missed(),
            "message posted"
        );

        Ok(stored)
    }

    async fn resolve_scope(&self, raw: Option<&str>) -> Result<MessageScope, ApplicationError> {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(MessageScope::Global);
        };

        // 格式非法的标识不可能指向任何房间
        let room_id = RoomId::parse(raw).map_err(|_| DomainError::RoomNotFound)?;
        let room = self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound)?;

        Ok(MessageScope::Room(room.id))
    }

    /// 历史消息，最新在前。未指定房间时返回旧版全局消息。
    pub async fn list_messages(&self, room_id: Option<&str>) -> Result<Vec<Message>, ApplicationError> {
        let scope = match room_id.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => MessageScope::Global,
            Some(raw) => match RoomId::parse(raw) {
                Ok(room_id) => MessageScope::Room(room_id),
                Err(_) => return Ok(Vec::new()),
            },
        };

        Ok(self.deps.message_repository.list_by_scope(scope).await?)
    }
}
