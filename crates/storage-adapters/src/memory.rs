//! # In-memory store
//!
//! `DashMap`-backed implementation of both repositories. Used by the test
//! suites and for running the server without a database.
//!
//! Uniqueness of username and email is enforced through index maps whose
//! entries are reserved atomically; post saves check the version while
//! holding the entry's write lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{DomainError, Post, PostRepository, Result, User, UserRepository};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<Uuid, User>>,
    by_username: Arc<DashMap<String, Uuid>>,
    by_email: Arc<DashMap<String, Uuid>>,
    posts: Arc<DashMap<Uuid, Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: User) -> Result<User> {
        match self.by_username.entry(user.username.clone()) {
            Entry::Occupied(_) => return Err(DomainError::Conflict("username already taken".into())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                // release the username reserved above
                self.by_username.remove(&user.username);
                return Err(DomainError::Conflict("email already registered".into()));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| (*id, u.username.clone())))
            .collect())
    }

    async fn push_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::NotFound("user not found".into()))?;
        user.posts.push(post_id);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: Post) -> Result<Post> {
        match self.posts.entry(post.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict("post already exists".into())),
            Entry::Vacant(slot) => {
                slot.insert(post.clone());
                Ok(post)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.clone()))
    }

    async fn save(&self, mut post: Post) -> Result<Post> {
        let mut stored = self
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| DomainError::NotFound("post not found".into()))?;
        if stored.version != post.version {
            return Err(DomainError::VersionConflict);
        }
        post.version += 1;
        *stored = post.clone();
        Ok(post)
    }
}
