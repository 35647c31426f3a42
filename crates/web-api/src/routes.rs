use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use application::{
    ListMessagesRequest, MessageDto, ParticipantDto, PostMessageRequest,
    RegisterParticipantRequest,
};

use crate::{
    error::ApiError,
    extract::{UserHeader, USER_HEADER},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessagePayload {
    to: Option<String>,
    text: Option<String>,
    #[serde(rename = "type")]
    message_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    limit: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", post(register_participant).get(list_participants))
        .route("/messages", post(post_message).get(list_messages))
        .route("/status", post(heartbeat))
        .with_state(state)
}

/// 在路由外层加上请求追踪与 CORS
pub fn with_layers(router: Router, cors_origins: &[String]) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(cors_origins)),
    )
}

/// 未配置来源时允许任意来源
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_HEADER)])
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register_participant(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    state
        .participant_service
        .register(RegisterParticipantRequest { name: payload.name })
        .await?;

    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.participant_service.list().await?;
    Ok(Json(participants.iter().map(ParticipantDto::from).collect()))
}

async fn post_message(
    State(state): State<AppState>,
    UserHeader(sender): UserHeader,
    payload: Result<Json<PostMessagePayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    state
        .message_service
        .post(PostMessageRequest {
            sender,
            to: payload.to,
            text: payload.text,
            message_type: payload.message_type,
        })
        .await?;

    Ok(StatusCode::CREATED)
}

async fn list_messages(
    State(state): State<AppState>,
    UserHeader(viewer): UserHeader,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let Query(query) = query?;
    let messages = state
        .message_service
        .list_visible(ListMessagesRequest {
            viewer,
            limit: query.limit,
        })
        .await?;

    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

async fn heartbeat(
    State(state): State<AppState>,
    UserHeader(identity): UserHeader,
) -> Result<StatusCode, ApiError> {
    state.participant_service.heartbeat(identity).await?;
    Ok(StatusCode::OK)
}
