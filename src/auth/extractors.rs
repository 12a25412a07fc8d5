use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, error, warn};

use super::repo_types::User;
use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "access_token";

/// Bearer header first, `access_token` cookie as fallback.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|c| c.trim().strip_prefix("access_token="))
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// `HttpOnly; SameSite=Lax`, plus `Secure` only when `COOKIE_SECURE` is set.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Resolves the caller to a user, or `None`. Never rejects: bad, expired or
/// unknown tokens are anonymous.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        let claims = match state.jwt.verify(&token) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "invalid or expired token");
                return Ok(MaybeUser(None));
            }
        };

        let Some(store) = state.store.as_ref() else {
            warn!("store unavailable; treating request as anonymous");
            return Ok(MaybeUser(None));
        };

        match store.find_user_by_username(&claims.sub).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                error!(error = %e, username = %claims.sub, "user lookup failed");
                Ok(MaybeUser(None))
            }
        }
    }
}

/// Authenticated, active user. 401 when anonymous, 400 when deactivated.
pub struct ActiveUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = match MaybeUser::from_request_parts(parts, state).await {
            Ok(u) => u,
            Err(never) => match never {},
        };
        let user = user.ok_or(AppError::Unauthenticated)?;
        if !user.is_active {
            warn!(username = %user.username, "inactive user");
            return Err(AppError::InactiveUser);
        }
        Ok(ActiveUser(user))
    }
}
