use std::sync::Arc;

use domain::{DomainError, Message, MessageDraft, MessageId, MessageLimit, ParticipantName};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    /// 发送者身份，HTTP 层从 `User` 请求头取得
    pub sender: Option<String>,
    pub to: Option<String>,
    pub text: Option<String>,
    pub message_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListMessagesRequest {
    pub viewer: Option<String>,
    /// 查询参数中的原始值，由服务负责校验
    pub limit: Option<String>,
}

pub struct MessageServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 先校验消息格式，再确认发送者仍在聊天室中
    pub async fn post(&self, request: PostMessageRequest) -> Result<Message, ApplicationError> {
        let draft = MessageDraft::parse(request.to, request.text, request.message_type)?;

        let sender = request
            .sender
            .and_then(|raw| ParticipantName::parse(raw).ok())
            .ok_or(DomainError::ParticipantNotFound)?;

        self.deps
            .participant_repository
            .find_by_name(sender.clone())
            .await?
            .ok_or(DomainError::ParticipantNotFound)?;

        let message = Message::from_draft(MessageId::generate(), &sender, draft, self.deps.clock.now());
        let stored = self.deps.message_repository.create(message).await?;

        tracing::debug!(
            from = %stored.from,
            to = %stored.to,
            kind = %stored.kind,
            "message stored"
        );
        Ok(stored)
    }

    pub async fn list_visible(
        &self,
        request: ListMessagesRequest,
    ) -> Result<Vec<Message>, ApplicationError> {
        let limit = MessageLimit::parse(request.limit.as_deref())?;
        let viewer = request
            .viewer
            .and_then(|raw| ParticipantName::parse(raw).ok());

        Ok(self
            .deps
            .message_repository
            .list_visible(viewer, limit)
            .await?)
    }
}
