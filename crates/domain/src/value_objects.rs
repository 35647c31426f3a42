use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

/// 广播目标：发给所有人。
pub const BROADCAST_TARGET: &str = "Todos";

/// 系统消息的发送者名称。
pub const SYSTEM_SENDER: &str = "Servidor";

/// 消息唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

/// 经过验证的参与者名称，同时也是参与者的主键。按原样保存，不做裁剪。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ParticipantName> for String {
    fn from(value: ParticipantName) -> Self {
        value.0
    }
}

/// 历史消息查询的条数上限，必须是正整数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimit(u32);

impl MessageLimit {
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::invalid_argument("limit", "must be positive"));
        }
        Ok(Self(value))
    }

    /// 解析查询参数中的原始字符串。
    ///
    /// 取开头的可选符号与连续数字，忽略其后的内容（`10abc` 视为 10，`2.5` 视为 2）。
    /// 缺失、没有数字、小于等于 0 都视为非法；超出范围的值取 `u32::MAX`。
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        let raw = raw
            .ok_or_else(|| DomainError::invalid_argument("limit", "is required"))?
            .trim_start();
        let (negative, rest) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Err(DomainError::invalid_argument("limit", "must be an integer"));
        }
        // 只含数字时解析失败只可能是溢出
        let value = rest[..digits_len].parse::<u64>().unwrap_or(u64::MAX);
        if negative || value == 0 {
            return Err(DomainError::invalid_argument("limit", "must be positive"));
        }
        Ok(Self(u32::try_from(value).unwrap_or(u32::MAX)))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}
