use std::time::Duration;

use application::{MessageRepository, ParticipantRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Message, MessageId, MessageKind, MessageLimit, Participant, ParticipantName, RepositoryError,
    Timestamp, BROADCAST_TARGET,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    name: String,
    last_heartbeat: DateTime<Utc>,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = RepositoryError;

    fn try_from(value: ParticipantRecord) -> Result<Self, Self::Error> {
        let name =
            ParticipantName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Participant {
            name,
            last_heartbeat: value.last_heartbeat,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender: String,
    recipient: String,
    body: String,
    kind: String,
    clock_time: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let kind = value
            .kind
            .parse::<MessageKind>()
            .map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::from(value.id),
            from: value.sender,
            to: value.recipient,
            text: value.body,
            kind,
            time: value.clock_time,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn create(&self, participant: Participant) -> Result<Participant, RepositoryError> {
        // 主键冲突映射为 Conflict，兜住并发同名注册
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            INSERT INTO participants (name, last_heartbeat)
            VALUES ($1, $2)
            RETURNING name, last_heartbeat
            "#,
        )
        .bind(participant.name.as_str())
        .bind(participant.last_heartbeat)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Participant::try_from(record)
    }

    async fn find_by_name(
        &self,
        name: ParticipantName,
    ) -> Result<Option<Participant>, RepositoryError> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT name, last_heartbeat FROM participants WHERE name = $1"#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Participant::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT name, last_heartbeat FROM participants ORDER BY joined_seq"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn touch(&self, name: ParticipantName, at: Timestamp) -> Result<bool, RepositoryError> {
        let result = sqlx::query(r#"UPDATE participants SET last_heartbeat = $2 WHERE name = $1"#)
            .bind(name.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> Result<u64, RepositoryError> {
        let result = sqlx::query(r#"DELETE FROM participants WHERE last_heartbeat < $1"#)
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, sender, recipient, body, kind, clock_time, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sender, recipient, body, kind, clock_time, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn list_visible(
        &self,
        viewer: Option<ParticipantName>,
        limit: MessageLimit,
    ) -> Result<Vec<Message>, RepositoryError> {
        // viewer 为 NULL 时前两个条件恒不成立
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender, recipient, body, kind, clock_time, created_at
            FROM messages
            WHERE recipient = $1
               OR sender = $1
               OR recipient = $2
               OR kind = 'message'
            ORDER BY created_at DESC, seq DESC
            LIMIT $3
            "#,
        )
        .bind(viewer.as_ref().map(ParticipantName::as_str))
        .bind(BROADCAST_TARGET)
        .bind(i64::from(limit.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

/// 同一连接池上的两个仓储
#[derive(Clone)]
pub struct PgStorage {
    pub participant_repository: PgParticipantRepository,
    pub message_repository: PgMessageRepository,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            participant_repository: PgParticipantRepository::new(pool.clone()),
            message_repository: PgMessageRepository::new(pool),
        }
    }
}
