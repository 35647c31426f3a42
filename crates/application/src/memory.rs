//! 内存实现的存储（用于测试和本地运行）
//!
//! 语义与 PostgreSQL 实现保持一致：参与者按插入顺序返回，
//! 消息按写入时间倒序、同一时间戳按写入先后倒序。

use async_trait::async_trait;
use domain::{Message, MessageLimit, Participant, ParticipantName, RepositoryError, Timestamp};
use tokio::sync::RwLock;

use crate::repository::{MessageRepository, ParticipantRepository};

#[derive(Default)]
pub struct MemoryParticipantRepository {
    participants: RwLock<Vec<Participant>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn create(&self, participant: Participant) -> Result<Participant, RepositoryError> {
        let mut participants = self.participants.write().await;
        if participants.iter().any(|p| p.name == participant.name) {
            return Err(RepositoryError::Conflict);
        }
        participants.push(participant.clone());
        Ok(participant)
    }

    async fn find_by_name(
        &self,
        name: ParticipantName,
    ) -> Result<Option<Participant>, RepositoryError> {
        let participants = self.participants.read().await;
        Ok(participants.iter().find(|p| p.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.participants.read().await.clone())
    }

    async fn touch(&self, name: ParticipantName, at: Timestamp) -> Result<bool, RepositoryError> {
        let mut participants = self.participants.write().await;
        match participants.iter_mut().find(|p| p.name == name) {
            Some(participant) => {
                participant.heartbeat(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> Result<u64, RepositoryError> {
        let mut participants = self.participants.write().await;
        let before = participants.len();
        participants.retain(|p| !p.is_stale(cutoff));
        Ok((before - participants.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_visible(
        &self,
        viewer: Option<ParticipantName>,
        limit: MessageLimit,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        // 先倒序再稳定排序，时间戳相同的保持后写入的在前
        let mut visible: Vec<Message> = messages
            .iter()
            .rev()
            .filter(|m| m.is_visible_to(viewer.as_ref()))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible.truncate(limit.get() as usize);
        Ok(visible)
    }
}
