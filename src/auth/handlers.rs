use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tera::Context;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterForm},
        extractors::{clear_session_cookie, session_cookie, ActiveUser},
        repo_types::NewUser,
    },
    error::AppError,
    state::AppState,
    store::{StoreError, UniqueField},
    templates::render,
};

pub const INVALID_CREDENTIALS: &str = "Incorrect username or password";
const MIN_USERNAME_LEN: usize = 3;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/users/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// 302 to the dashboard carrying a fresh session cookie.
fn session_redirect(state: &AppState, username: &str) -> Result<Response, AppError> {
    let token = state.jwt.sign(username).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })?;
    let cookie = session_cookie(&token, state.jwt.ttl_secs(), state.config.cookie_secure);
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, "/dashboard".to_string()), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

pub async fn register_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut ctx = Context::new();
    ctx.insert("title", "Register - WizKnowledge");
    ctx.insert("user", &Option::<PublicUser>::None);
    render(&state.templates, "register.html", &ctx)
}

pub async fn login_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut ctx = Context::new();
    ctx.insert("title", "Login - WizKnowledge");
    ctx.insert("user", &Option::<PublicUser>::None);
    render(&state.templates, "login.html", &ctx)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let store = state.store()?;

    require(&form.username, "username")?;
    require(&form.email, "email")?;
    require(&form.password, "password")?;
    require(&form.confirm_password, "confirm_password")?;

    let username = form.username.trim().to_string();
    let email = form.email.trim().to_lowercase();

    if form.password != form.confirm_password {
        warn!("passwords do not match");
        return Err(AppError::validation("Passwords do not match"));
    }

    // Lab policy: the minimum defaults to 3 characters.
    if form.password.chars().count() < state.passwords.min_length() {
        warn!("password too short");
        return Err(AppError::validation("Password too short"));
    }

    if username.chars().count() < MIN_USERNAME_LEN {
        warn!(username = %username, "username too short");
        return Err(AppError::validation(
            "Username must be at least 3 characters long",
        ));
    }

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    // Distinct messages per field leak which one exists.
    if store.find_user_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already registered");
        return Err(StoreError::Conflict(UniqueField::Username).into());
    }
    if store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(StoreError::Conflict(UniqueField::Email).into());
    }

    let password_hash = state.passwords.hash(&form.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Internal(e)
    })?;

    let user = store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "create user failed");
            AppError::from(e)
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    session_redirect(&state, &user.username)
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let store = state.store()?;
    let username = form.username.trim();

    let user = match store.find_user_by_username(username).await? {
        Some(u) => u,
        None => {
            state.passwords.verify_absent(&form.password);
            warn!(username = %username, "login unknown username");
            return Err(AppError::validation(INVALID_CREDENTIALS));
        }
    };

    let ok = state
        .passwords
        .verify(&form.password, &user.password_hash)
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            AppError::Internal(e)
        })?;

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::validation(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    session_redirect(&state, &user.username)
}

/// Drops the cookie only; the token itself stays valid until it expires.
pub async fn logout() -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie()),
        ],
    )
        .into_response()
}

pub async fn get_me(ActiveUser(user): ActiveUser) -> Json<PublicUser> {
    Json(user.into())
}
