use domain::{Message, MessageKind, Participant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub name: String,
    /// 最近一次心跳，Unix 毫秒
    #[serde(rename = "lastStatus")]
    pub last_status: i64,
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        Self {
            name: participant.name.as_str().to_owned(),
            last_status: participant.last_heartbeat.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: MessageKind,
    pub time: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            from: message.from.clone(),
            to: message.to.clone(),
            text: message.text.clone(),
            message_type: message.kind,
            time: message.time.clone(),
        }
    }
}
