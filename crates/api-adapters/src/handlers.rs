//! # api-adapters Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.
//! Handlers stay thin: extract, call one service method, shape the JSON.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::{CookieJar, WithRejection};
use domains::{DomainError, NewUser};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::extract::{AuthUser, SESSION_COOKIE};
use crate::metrics::LoginOutcome;
use crate::AppState;

type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// `{ "text": ... }`. A missing field is treated like an empty one.
#[derive(Debug, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

// ── Comments ─────────────────────────────────────────────────────────────────

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
    WithRejection(Json(body), _): JsonBody<TextBody>,
) -> Result<impl IntoResponse, ApiError> {
    let text = body.text.unwrap_or_default();
    let result = state.comments.add_comment(&post_id, user_id, &text).await;

    match &result {
        Ok(_) => {
            state.metrics.comments_added.inc();
        }
        Err(DomainError::Moderation { .. }) => {
            state.metrics.comments_rejected.inc();
        }
        Err(_) => {}
    }
    let comment = result?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment added", "comment": comment })),
    ))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .comments
        .delete_comment(&post_id, &comment_id, user_id)
        .await?;
    state.metrics.comments_deleted.inc();

    Ok(Json(json!({ "message": "Comment deleted", "updatedPost": updated })))
}

// ── Posts ────────────────────────────────────────────────────────────────────

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    WithRejection(Json(body), _): JsonBody<TextBody>,
) -> Result<impl IntoResponse, ApiError> {
    let text = body.text.unwrap_or_default();
    let result = state.posts.create_post(user_id, &text).await;
    if let Err(DomainError::Moderation { .. }) = &result {
        state.metrics.posts_rejected.inc();
    }
    let post = result?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created", "post": post })),
    ))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.posts.get_post(&post_id).await?))
}

// ── Accounts ─────────────────────────────────────────────────────────────────

pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): JsonBody<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered", "user": user })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(body), _): JsonBody<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = match state.auth.login(&body.email, &body.password).await {
        Ok(session) => {
            state.metrics.login(LoginOutcome::Success);
            session
        }
        Err(err) => {
            state.metrics.login(LoginOutcome::Failure);
            return Err(err.into());
        }
    };

    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure);

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "token": session.token,
            "user": session.user,
        })),
    ))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    (jar, Json(json!({ "message": "Logged out" })))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .profiles
        .profile(user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("user not found".into()))?;
    Ok(Json(profile))
}

// ── Ops ──────────────────────────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.render().map_err(DomainError::internal)?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    ))
}
