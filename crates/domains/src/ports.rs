//! # Ports
//!
//! Every adapter implements one of these traits; services only ever see
//! `Arc<dyn Trait>` handles, handed to them explicitly at construction.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Analysis, Post, User};

/// Persistence contract for user documents.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn insert(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Resolves ids to usernames. Unknown ids are absent from the map.
    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>>;
    /// Appends a post reference to the user's `posts` list.
    async fn push_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()>;
}

/// Persistence contract for posts and their embedded comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: Post) -> Result<Post>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Writes the whole post if the stored version still equals
    /// `post.version`, returning it with the bumped version.
    ///
    /// Fails with `VersionConflict` on a stale version and `NotFound` if the
    /// post is gone.
    async fn save(&self, post: Post) -> Result<Post>;
}

/// Text classification contract for user-submitted content.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentFilter: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Analysis>;
}

/// One-way password transform.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Salts and hashes `password`.
    fn hash(&self, password: &str) -> Result<String>;
    /// `Ok(false)` on mismatch; `Err` only if `hash` is unreadable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Session token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: Uuid) -> Result<String>;
    /// Returns the user id the token was issued for.
    fn verify(&self, token: &str) -> Result<Uuid>;
}
