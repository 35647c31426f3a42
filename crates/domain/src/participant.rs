use crate::value_objects::{ParticipantName, Timestamp};

/// 聊天室参与者。名称创建后不可变，心跳时间随每次 `/status` 调用前移。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Participant {
    pub name: ParticipantName,
    pub last_heartbeat: Timestamp,
}

impl Participant {
    pub fn register(name: ParticipantName, now: Timestamp) -> Self {
        Self {
            name,
            last_heartbeat: now,
        }
    }

    pub fn heartbeat(&mut self, now: Timestamp) {
        self.last_heartbeat = now;
    }

    /// 心跳严格早于截止时间才算过期
    pub fn is_stale(&self, cutoff: Timestamp) -> bool {
        self.last_heartbeat < cutoff
    }
}
