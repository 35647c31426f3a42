//! 在线状态清理
//!
//! 后台任务按固定周期删除心跳过期的参与者，并为每一轮清理
//! 写入一条汇总通知。任务通过 `CancellationToken` 停止。

use std::{sync::Arc, time::Duration};

use domain::{Message, MessageId};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

/// 清理周期的下限，零周期会按该值运行
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// 清理周期与过期阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSettings {
    pub sweep_interval: Duration,
    pub stale_after: Duration,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(15),
            stale_after: Duration::from_secs(10),
        }
    }
}

pub struct PresenceSweeperDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct PresenceSweeper {
    deps: PresenceSweeperDependencies,
    settings: PresenceSettings,
}

impl PresenceSweeper {
    pub fn new(deps: PresenceSweeperDependencies, settings: PresenceSettings) -> Self {
        Self { deps, settings }
    }

    /// 执行一轮清理，返回被移除的参与者数量。
    ///
    /// 删除与写通知不在同一事务中。
    pub async fn sweep_once(&self) -> Result<u64, ApplicationError> {
        let stale_after = chrono::Duration::from_std(self.settings.stale_after).map_err(|err| {
            ApplicationError::infrastructure(format!("invalid stale threshold: {err}"))
        })?;
        let now = self.deps.clock.now();
        let cutoff = now - stale_after;

        let evicted = self
            .deps
            .participant_repository
            .delete_stale(cutoff)
            .await?;

        if evicted > 0 {
            self.deps
                .message_repository
                .create(Message::eviction_notice(MessageId::generate(), evicted, now))
                .await?;
        }

        Ok(evicted)
    }

    /// 周期执行清理直到 `shutdown` 被取消。
    ///
    /// 首次清理发生在启动一个周期之后；单轮失败只记录日志，不影响后续周期。
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let period = if self.settings.sweep_interval.is_zero() {
            tracing::warn!(
                fallback_ms = MIN_SWEEP_INTERVAL.as_millis() as u64,
                "sweep interval is zero, using fallback"
            );
            MIN_SWEEP_INTERVAL
        } else {
            self.settings.sweep_interval
        };
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = period.as_millis() as u64,
            stale_after_ms = self.settings.stale_after.as_millis() as u64,
            "presence sweeper started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(0) => tracing::trace!("presence sweep found nothing stale"),
                        Ok(evicted) => tracing::info!(evicted, "removed inactive participants"),
                        Err(err) => tracing::error!(error = %err, "presence sweep failed"),
                    }
                }
            }
        }

        tracing::info!("presence sweeper stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
