//! 应用装配与生命周期。

use std::{future::Future, sync::Arc};

use anyhow::Context;
use application::{
    Clock, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, PresenceSettings, PresenceSweeper,
    PresenceSweeperDependencies, SystemClock,
};
use axum::Router;
use config::AppConfig;
use infrastructure::Infrastructure;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    routes::{router, with_layers},
    state::AppState,
};

/// 一个可运行的聊天服务：存储、服务、清理任务和路由
pub struct ChatApp {
    bind_address: String,
    infrastructure: Infrastructure,
    sweeper: Arc<PresenceSweeper>,
    router: Router,
}

impl ChatApp {
    /// 按配置连接存储并装配所有组件
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let infrastructure = Infrastructure::connect(&config.database)
            .await
            .context("failed to initialise storage")?;
        let settings = PresenceSettings {
            sweep_interval: config.presence.sweep_interval(),
            stale_after: config.presence.stale_after(),
        };

        Ok(Self::from_parts(
            config,
            infrastructure,
            Arc::new(SystemClock),
            settings,
        ))
    }

    pub fn from_parts(
        config: &AppConfig,
        infrastructure: Infrastructure,
        clock: Arc<dyn Clock>,
        settings: PresenceSettings,
    ) -> Self {
        let participant_service = ParticipantService::new(ParticipantServiceDependencies {
            participant_repository: infrastructure.participant_repository.clone(),
            message_repository: infrastructure.message_repository.clone(),
            clock: clock.clone(),
        });
        let message_service = MessageService::new(MessageServiceDependencies {
            participant_repository: infrastructure.participant_repository.clone(),
            message_repository: infrastructure.message_repository.clone(),
            clock: clock.clone(),
        });
        let sweeper = Arc::new(PresenceSweeper::new(
            PresenceSweeperDependencies {
                participant_repository: infrastructure.participant_repository.clone(),
                message_repository: infrastructure.message_repository.clone(),
                clock,
            },
            settings,
        ));

        let state = AppState::new(Arc::new(participant_service), Arc::new(message_service));
        let router = with_layers(router(state), &config.server.cors_origins);

        Self {
            bind_address: config.bind_address(),
            infrastructure,
            sweeper,
            router,
        }
    }

    pub fn sweeper(&self) -> Arc<PresenceSweeper> {
        self.sweeper.clone()
    }

    /// 绑定配置中的地址并运行到 `shutdown` 完成
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .with_context(|| format!("failed to bind {}", self.bind_address))?;
        self.serve(listener, shutdown).await
    }

    /// 在已绑定的监听器上提供服务。
    ///
    /// 停止顺序：HTTP 服务退出后取消清理任务并等待其结束，最后关闭存储。
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        let token = CancellationToken::new();
        let sweeper_handle = self.sweeper.clone().spawn(token.clone());

        tracing::info!(address = %local_addr, "chat server listening");
        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await;

        token.cancel();
        if let Err(err) = sweeper_handle.await {
            tracing::error!(error = %err, "presence sweeper task failed");
        }
        self.infrastructure.close().await;
        tracing::info!("chat server stopped");

        served.context("http server error")
    }
}
