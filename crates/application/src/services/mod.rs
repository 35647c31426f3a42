mod message_service;
mod participant_service;


pub use message_service::{
    ListMessagesRequest, MessageService, MessageServiceDependencies, PostMessageRequest,
};
pub use participant_service::{
    ParticipantService, ParticipantServiceDependencies, RegisterParticipantRequest,
};
