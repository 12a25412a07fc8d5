use axum::{extract::State, response::Html, Json};
use serde::Serialize;
use tera::Context;
use time::OffsetDateTime;

use crate::{
    auth::{dto::PublicUser, extractors::MaybeUser},
    error::AppError,
    state::AppState,
    templates::render,
};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

pub async fn home(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, AppError> {
    let mut ctx = Context::new();
    ctx.insert("title", "WizKnowledge AI Q&A System");
    ctx.insert("user", &user.map(PublicUser::from));
    render(&state.templates, "index.html", &ctx)
}

/// Liveness only; does not touch the store or the responder.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: OffsetDateTime::now_utc(),
    })
}
