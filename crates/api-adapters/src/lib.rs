//! # api-adapters
//!
//! The HTTP layer for campusnet: routing, extractors, error mapping and the
//! server-rendered profile page.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pages;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use domains::{ContentFilter, PasswordHasher, PostRepository, TokenIssuer, UserRepository};
use services::{AuthService, CommentService, PostService, ProfileService};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub use error::ApiError;
pub use extract::{AuthUser, SESSION_COOKIE};
pub use metrics::Metrics;

/// Shared state handed to every handler.
pub struct AppState {
    pub auth: AuthService,
    pub comments: CommentService,
    pub posts: PostService,
    pub profiles: ProfileService,
    pub metrics: Metrics,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        filter: Arc<dyn ContentFilter>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            auth: AuthService::new(users.clone(), hasher, tokens),
            comments: CommentService::new(posts.clone(), users.clone(), filter.clone()),
            posts: PostService::new(posts, users.clone(), filter),
            profiles: ProfileService::new(users),
            metrics: Metrics::new(),
            cookie_secure,
        }
    }
}

/// Builds the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/profile", get(handlers::profile))
        .route("/posts", post(handlers::create_post))
        .route("/posts/{post_id}", get(handlers::get_post))
        .route("/posts/{post_id}/comments", post(handlers::add_comment))
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            delete(handlers::delete_comment),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/profile", get(pages::profile_page))
        .nest("/api", api)
        .layer(middleware::cors_policy())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(middleware::trace_layer())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
