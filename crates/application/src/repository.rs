use async_trait::async_trait;
use domain::{Message, MessageLimit, Participant, ParticipantName, RepositoryError, Timestamp};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// 名称重复时返回 `RepositoryError::Conflict`
    async fn create(&self, participant: Participant) -> Result<Participant, RepositoryError>;

    async fn find_by_name(
        &self,
        name: ParticipantName,
    ) -> Result<Option<Participant>, RepositoryError>;

    // 按存储的自然顺序返回全部参与者
    async fn list_all(&self) -> Result<Vec<Participant>, RepositoryError>;

    /// 更新心跳时间，返回是否命中了记录。记录已被清理时返回 `false`。
    async fn touch(&self, name: ParticipantName, at: Timestamp) -> Result<bool, RepositoryError>;

    /// 删除心跳严格早于 `cutoff` 的参与者，返回删除数量
    async fn delete_stale(&self, cutoff: Timestamp) -> Result<u64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError>;

    /// 按可见性过滤，最新的在前，最多返回 `limit` 条
    async fn list_visible(
        &self,
        viewer: Option<ParticipantName>,
        limit: MessageLimit,
    ) -> Result<Vec<Message>, RepositoryError>;
}
