use std::sync::Arc;

use domain::{DomainError, Message, MessageId, Participant, ParticipantName, RepositoryError};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

#[derive(Debug, Clone)]
pub struct RegisterParticipantRequest {
    pub name: Option<String>,
}

pub struct ParticipantServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ParticipantService {
    deps: ParticipantServiceDependencies,
}

impl ParticipantService {
    pub fn new(deps: ParticipantServiceDependencies) -> Self {
        Self { deps }
    }

    /// 注册参与者并广播加入通知。
    ///
    /// 两次写入不在同一事务中：参与者写入成功而通知写入失败时，
    /// 参与者保持已注册状态。
    pub async fn register(
        &self,
        request: RegisterParticipantRequest,
    ) -> Result<Participant, ApplicationError> {
        let name = ParticipantName::parse(
            request
                .name
                .ok_or_else(|| DomainError::invalid_argument("name", "is required"))?,
        )?;

        if self
            .deps
            .participant_repository
            .find_by_name(name.clone())
            .await?
            .is_some()
        {
            return Err(DomainError::ParticipantAlreadyExists.into());
        }

        let now = self.deps.clock.now();
        let stored = self
            .deps
            .participant_repository
            .create(Participant::register(name, now))
            .await
            .map_err(|err| match err {
                // 并发注册同名时由存储层兜底
                RepositoryError::Conflict => DomainError::ParticipantAlreadyExists.into(),
                other => ApplicationError::from(other),
            })?;

        self.deps
            .message_repository
            .create(Message::join_notice(MessageId::generate(), &stored.name, now))
            .await?;

        tracing::info!(participant = %stored.name, "participant joined");
        Ok(stored)
    }

    /// 刷新心跳。身份缺失、未注册或刚被清理都返回 `ParticipantNotFound`。
    pub async fn heartbeat(&self, identity: Option<String>) -> Result<(), ApplicationError> {
        let name = identity
            .and_then(|raw| ParticipantName::parse(raw).ok())
            .ok_or(DomainError::ParticipantNotFound)?;

        let now = self.deps.clock.now();
        let matched = self
            .deps
            .participant_repository
            .touch(name.clone(), now)
            .await?;
        if !matched {
            tracing::debug!(participant = %name, "heartbeat for unknown participant");
            return Err(DomainError::ParticipantNotFound.into());
        }

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participant_repository.list_all().await?)
    }
}
