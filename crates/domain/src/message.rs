use std::{fmt, str::FromStr};

use chrono::Local;

use crate::errors::DomainError;
use crate::value_objects::{MessageId, ParticipantName, Timestamp, BROADCAST_TARGET, SYSTEM_SENDER};

/// 参与者加入时广播的提示文本
pub const JOIN_NOTICE_TEXT: &str = "entra na sala...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// 公开聊天
    Message,
    /// 定向私聊
    PrivateMessage,
    /// 系统生成的加入/清理通知
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// 客户端只能提交 `message` 与 `private_message`，`status` 由系统生成。
    pub fn parse_submitted(value: &str) -> Result<Self, DomainError> {
        match value {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            _ => Err(DomainError::invalid_argument(
                "type",
                "must be one of: message, private_message",
            )),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(MessageKind::Status),
            other => MessageKind::parse_submitted(other),
        }
    }
}

/// 客户端提交的消息，已经过格式校验但尚未确认发送者。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

impl MessageDraft {
    pub fn parse(
        to: Option<String>,
        text: Option<String>,
        kind: Option<String>,
    ) -> Result<Self, DomainError> {
        let to = required("to", to)?;
        let text = required("text", text)?;
        let kind = kind
            .ok_or_else(|| DomainError::invalid_argument("type", "is required"))
            .and_then(|kind| MessageKind::parse_submitted(&kind))?;
        Ok(Self { to, text, kind })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, DomainError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(DomainError::invalid_argument(field, "cannot be empty")),
        None => Err(DomainError::invalid_argument(field, "is required")),
    }
}

/// 聊天记录，写入后不可修改。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    /// 本地时间 `HH:MM:SS`，沿用客户端约定的展示格式
    pub time: String,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: clock_time(now),
            created_at: now,
        }
    }

    pub fn from_draft(
        id: MessageId,
        sender: &ParticipantName,
        draft: MessageDraft,
        now: Timestamp,
    ) -> Self {
        Self::new(id, sender.as_str(), draft.to, draft.text, draft.kind, now)
    }

    pub fn join_notice(id: MessageId, participant: &ParticipantName, now: Timestamp) -> Self {
        Self::new(
            id,
            participant.as_str(),
            BROADCAST_TARGET,
            JOIN_NOTICE_TEXT,
            MessageKind::Status,
            now,
        )
    }

    /// 一次清理只生成一条汇总通知
    pub fn eviction_notice(id: MessageId, evicted: u64, now: Timestamp) -> Self {
        Self::new(
            id,
            SYSTEM_SENDER,
            BROADCAST_TARGET,
            format!("{evicted} participante(s) removido(s) por inatividade"),
            MessageKind::Status,
            now,
        )
    }

    /// 发给自己、自己发出、广播、或公开聊天的消息可见。
    /// 未提供身份时只有后两类可见。
    pub fn is_visible_to(&self, viewer: Option<&ParticipantName>) -> bool {
        if self.to == BROADCAST_TARGET || self.kind == MessageKind::Message {
            return true;
        }
        match viewer {
            Some(name) => self.to == name.as_str() || self.from == name.as_str(),
            None => false,
        }
    }
}

/// 将时间戳格式化为本地 `HH:MM:SS`
pub fn clock_time(at: Timestamp) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}
