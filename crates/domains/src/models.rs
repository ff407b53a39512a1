//! # Domain Models
//!
//! These structs represent the core entities of campusnet.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! Entities (`User`, `Post`) never leave the service layer directly; the
//! serializable views at the bottom of this module are what handlers return.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// PHC-formatted salted hash. Plaintext is never stored.
    pub password_hash: String,
    pub name: String,
    pub mobile: String,
    pub college_name: String,
    pub dob: NaiveDate,
    /// Posts authored by this user, oldest first.
    pub posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload. `password` is plaintext until the auth service hashes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub mobile: String,
    pub college_name: String,
    pub dob: NaiveDate,
}

/// A comment embedded in its post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique within the owning post
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub commentor: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A post and its embedded, ordered comment list.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    /// Bumped by the store on every successful save; a save carrying a
    /// stale version is rejected.
    pub version: i64,
}

impl Post {
    pub fn new(author: Uuid, text: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            author,
            text,
            comments: Vec::new(),
            created_at: Utc::now(),
            version: 0,
        }
    }

    /// Appends a comment authored by `commentor` and returns it.
    pub fn push_comment(&mut self, commentor: Uuid, text: String) -> &Comment {
        self.comments.push(Comment {
            id: Uuid::now_v7(),
            commentor,
            text,
            created_at: Utc::now(),
        });
        // just pushed
        &self.comments[self.comments.len() - 1]
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Both the post's author and the comment's author may remove a comment.
    pub fn may_delete(&self, comment: &Comment, user_id: Uuid) -> bool {
        self.author == user_id || comment.commentor == user_id
    }

    /// Removes a comment, returning it if it was present.
    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == comment_id)?;
        Some(self.comments.remove(idx))
    }

    /// Every distinct commentor id, in first-appearance order.
    pub fn commentor_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::new();
        for c in &self.comments {
            if !ids.contains(&c.commentor) {
                ids.push(c.commentor);
            }
        }
        ids
    }
}

/// Result of running text through a content filter.
///
/// `tags` names each kind of disallowed content found; an empty list means
/// the text is clean. Any extra fields the analysis backend reports are kept
/// verbatim so they can be echoed back to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Analysis {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn with_tags(tags: Vec<String>) -> Self {
        Self { tags, extra: serde_json::Map::new() }
    }

    pub fn is_flagged(&self) -> bool {
        !self.tags.is_empty()
    }
}

// ── Views ────────────────────────────────────────────────────────────────────

/// A user reference with the username joined in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
}

/// A comment with its commentor resolved. `commentor` is `None` when the
/// referenced user no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub commentor: Option<UserRef>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i64,
}

impl PostView {
    /// Joins commentor usernames from `usernames` into the post's comments.
    pub fn populate(post: Post, usernames: &HashMap<Uuid, String>) -> Self {
        let comments = post
            .comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                commentor: usernames.get(&c.commentor).map(|username| UserRef {
                    id: c.commentor,
                    username: username.clone(),
                }),
                text: c.text,
                created_at: c.created_at,
            })
            .collect();

        Self {
            id: post.id,
            author: post.author,
            text: post.text,
            comments,
            created_at: post.created_at,
            version: post.version,
        }
    }
}

/// Public profile fields. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub mobile: String,
    pub college_name: String,
    pub dob: NaiveDate,
    pub posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            mobile: user.mobile.clone(),
            college_name: user.college_name.clone(),
            dob: user.dob,
            posts: user.posts.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
