//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、存储往返，
//! 以及后台的在线状态清理任务。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod presence;
pub mod repository;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use presence::{
    PresenceSettings, PresenceSweeper, PresenceSweeperDependencies, MIN_SWEEP_INTERVAL,
};
pub use repository::{MessageRepository, ParticipantRepository};
pub use services::{
    ListMessagesRequest, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, PostMessageRequest, RegisterParticipantRequest,
};
