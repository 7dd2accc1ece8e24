use axum::{
    extract::{rejection::JsonRejection, ws::WebSocketUpgrade, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::services::{AuthenticateUserRequest, PostMessageRequest, RegisterUserRequest};
use application::{MessageDto, RoomDto, TokenDto, UserDto};

use crate::{auth::bearer_token, error::ApiError, state::AppState, ws_connection::WebSocketConnection};

const BANNER: &str = "API is running. Try GET /health, /rooms, or /messages?roomId=...";

// 字段缺失按空串处理，交给服务层统一校验
#[derive(Debug, Deserialize)]
struct CredentialsPayload {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateRoomPayload {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostMessagePayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagesQuery {
    room_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/messages", get(list_messages).post(post_message))
        .route("/ws", get(websocket_upgrade))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn banner() -> &'static str {
    BANNER
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let Json(payload) = payload?;
    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username.unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<Json<TokenDto>, ApiError> {
    let Json(payload) = payload?;
    let user = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            username: payload.username.unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
        })
        .await?;

    let token = state.jwt_service.generate_token(&user)?;
    Ok(Json(TokenDto { token }))
}

async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomDto>>, ApiError> {
    let rooms = state.room_service.list_rooms().await?;
    Ok(Json(rooms.into_iter().map(RoomDto::from).collect()))
}

async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<CreateRoomPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let Json(payload) = payload?;
    let room = state
        .room_service
        .create_room(payload.name.as_deref().unwrap_or_default())
        .await?;

    Ok((StatusCode::CREATED, Json(RoomDto::from(room))))
}

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state
        .message_service
        .list_messages(query.room_id.as_deref())
        .await?;

    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PostMessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let Json(payload) = payload?;
    let message = state
        .message_service
        .post_message(PostMessageRequest {
            text: payload.text.unwrap_or_default(),
            author: payload.author.unwrap_or_default(),
            room_id: payload.room_id,
            credential: bearer_token(&headers),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDto::from(message))))
}

async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| WebSocketConnection::new(socket, state.fanout.clone()).run())
}
