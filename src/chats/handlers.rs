use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use tera::Context;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{dto::PublicUser, extractors::ActiveUser},
    chats::{
        dto::{ChatForm, ChatHistory, ChatItem, ChatReply},
        repo_types::NewChat,
    },
    error::AppError,
    state::AppState,
    templates::render,
};

pub const DASHBOARD_LIMIT: i64 = 20;
pub const HISTORY_LIMIT: i64 = 50;

pub fn page_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/api/chats", get(list_chats))
}

#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
) -> Result<Html<String>, AppError> {
    let chats: Vec<ChatItem> = state
        .store()?
        .recent_chats(user.id, DASHBOARD_LIMIT)
        .await?
        .into_iter()
        .map(ChatItem::from)
        .collect();

    let mut ctx = Context::new();
    ctx.insert("title", &format!("Dashboard - {}", user.username));
    ctx.insert("chats", &chats);
    ctx.insert("user", &PublicUser::from(user));
    render(&state.templates, "dashboard.html", &ctx)
}

/// Message goes to the responder and into the store as-is (no sanitizing, no rate limit).
#[instrument(skip_all, fields(user_id))]
pub async fn post_chat(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Form(form): Form<ChatForm>,
) -> Result<Json<ChatReply>, AppError> {
    tracing::Span::current().record("user_id", tracing::field::display(user.id));

    if form.message.trim().is_empty() {
        warn!("empty chat message");
        return Err(AppError::validation("Message cannot be empty"));
    }
    let store = state.store()?;

    let answer = state
        .responder
        .answer(&form.message, form.context.as_deref())
        .await;

    let chat = store
        .insert_chat(NewChat {
            user_id: user.id,
            message: form.message,
            response: answer.text,
            timestamp: OffsetDateTime::now_utc(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "insert chat failed");
            AppError::from(e)
        })?;

    info!(chat_id = %chat.id, confidence = ?answer.confidence, "chat answered");
    Ok(Json(ChatReply {
        message: chat.message,
        response: chat.response,
        timestamp: chat.timestamp,
        confidence: answer.confidence,
    }))
}

#[instrument(skip_all)]
pub async fn list_chats(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
) -> Result<Json<ChatHistory>, AppError> {
    let chats = state
        .store()?
        .recent_chats(user.id, HISTORY_LIMIT)
        .await?
        .into_iter()
        .map(ChatItem::from)
        .collect();
    Ok(Json(ChatHistory { chats }))
}
