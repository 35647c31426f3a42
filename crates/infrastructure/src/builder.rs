use std::sync::Arc;

use application::{
    MemoryMessageRepository, MemoryParticipantRepository, MessageRepository,
    ParticipantRepository,
};
use config::{DatabaseConfig, StorageBackend};
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 装配好的存储，服务与后台任务共享同一组仓储
#[derive(Clone)]
pub struct Infrastructure {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pool: Option<PgPool>,
}

impl Infrastructure {
    /// 按配置的后端建立存储。PostgreSQL 后端会在启动时执行迁移。
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        match config.backend {
            StorageBackend::Postgres => {
                let pool = create_pg_pool(
                    &config.url,
                    config.max_connections,
                    config.acquire_timeout(),
                )
                .await?;
                MIGRATOR.run(&pool).await?;
                tracing::info!(max_connections = config.max_connections, "postgres storage ready");
                Ok(Self::postgres(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage, data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let storage = PgStorage::new(pool.clone());
        Self {
            participant_repository: Arc::new(storage.participant_repository),
            message_repository: Arc::new(storage.message_repository),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            participant_repository: Arc::new(MemoryParticipantRepository::new()),
            message_repository: Arc::new(MemoryMessageRepository::new()),
            pool: None,
        }
    }

    /// 关闭连接池；内存后端无操作
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("postgres pool closed");
        }
    }
}
