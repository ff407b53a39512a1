//! Post creation and retrieval, plus the commentor join shared with the
//! comment service.

use std::sync::Arc;

use domains::{ContentFilter, DomainError, Post, PostRepository, PostView, Result, UserRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::parse_id;

/// Resolves every commentor of `post` to a username.
pub(crate) async fn populate(users: &dyn UserRepository, post: Post) -> Result<PostView> {
    let usernames = users.usernames(&post.commentor_ids()).await?;
    Ok(PostView::populate(post, &usernames))
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    filter: Arc<dyn ContentFilter>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        filter: Arc<dyn ContentFilter>,
    ) -> Self {
        Self { posts, users, filter }
    }

    /// Creates a post authored by `author` and records it on the author.
    pub async fn create_post(&self, author: Uuid, text: &str) -> Result<PostView> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("Post text cannot be empty".into()));
        }

        let analysis = self.filter.analyze(trimmed).await?;
        if analysis.is_flagged() {
            warn!(%author, tags = ?analysis.tags, "post rejected by content filter");
            return Err(DomainError::Moderation {
                message: format!("Post contains offensive language: {}", analysis.tags.join(", ")),
                analysis,
            });
        }

        if self.users.find_by_id(author).await?.is_none() {
            return Err(DomainError::NotFound("user not found".into()));
        }

        let post = self.posts.insert(Post::new(author, text.to_string())).await?;
        self.users.push_post(author, post.id).await?;
        info!(post_id = %post.id, %author, "post created");

        populate(self.users.as_ref(), post).await
    }

    pub async fn get_post(&self, post_id: &str) -> Result<PostView> {
        let post_id = parse_id(post_id, "Invalid postId format")?;
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("post not found".into()))?;

        populate(self.users.as_ref(), post).await
    }
}
