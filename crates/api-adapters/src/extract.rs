//! Request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use domains::DomainError;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// The authenticated caller. Taken from `Authorization: Bearer <jwt>`, or
/// failing that from the session cookie.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(SESSION_COOKIE)
                    .map(|c| c.value().to_string())
            })
            .ok_or(DomainError::Unauthenticated)?;

        let user_id = state.auth.authenticate(&token)?;
        Ok(AuthUser(user_id))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}
