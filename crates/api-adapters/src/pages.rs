use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use domains::Profile;
use tracing::warn;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::AppState;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage<'a> {
    pub profile: Option<&'a Profile>,
    pub error: Option<&'a str>,
}

const LOAD_FAILED: &str = "Failed to load profile data";

/// `GET /profile`: the caller's profile as HTML.
pub async fn profile_page(
    State(state): State<Arc<AppState>>,
    user: Result<AuthUser, ApiError>,
) -> Response {
    let loaded = match user {
        Ok(AuthUser(user_id)) => state.profiles.profile(user_id).await.map_err(ApiError::from),
        Err(err) => Err(err),
    };

    let (status, page) = match &loaded {
        Ok(profile) => (
            StatusCode::OK,
            ProfilePage { profile: profile.as_ref(), error: None },
        ),
        Err(err) => {
            warn!(error = %err.0, "profile page failed");
            (err.status(), ProfilePage { profile: None, error: Some(LOAD_FAILED) })
        }
    };

    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "profile template failed to render");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
