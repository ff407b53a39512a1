//! Comment creation and deletion on a post's embedded comment list.
//!
//! Both operations are read-modify-write on the whole post. Writes carry the
//! version that was read; on a version conflict the change is re-applied to
//! a fresh read, up to [`MAX_WRITE_ATTEMPTS`] times.

use std::sync::Arc;

use domains::{
    CommentView, ContentFilter, DomainError, Post, PostRepository, PostView, Result, UserRepository,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::parse_id;
use crate::posts::populate;

pub const MAX_WRITE_ATTEMPTS: usize = 3;

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    filter: Arc<dyn ContentFilter>,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        filter: Arc<dyn ContentFilter>,
    ) -> Self {
        Self { posts, users, filter }
    }

    /// Appends a comment by `user_id` and returns it with the commentor's
    /// username joined in.
    pub async fn add_comment(&self, post_id: &str, user_id: Uuid, text: &str) -> Result<CommentView> {
        let post_id = parse_id(post_id, "Invalid postId format")?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("Comment text cannot be empty".into()));
        }

        let analysis = self.filter.analyze(trimmed).await?;
        if analysis.is_flagged() {
            warn!(%post_id, %user_id, tags = ?analysis.tags, "comment rejected by content filter");
            return Err(DomainError::Moderation {
                message: format!(
                    "Comment contains offensive language: {}",
                    analysis.tags.join(", ")
                ),
                analysis,
            });
        }

        let (saved, comment_id) = self
            .update_post(post_id, |post| Ok(post.push_comment(user_id, text.to_string()).id))
            .await?;
        info!(%post_id, %comment_id, %user_id, "comment added");

        let view = populate(self.users.as_ref(), saved).await?;
        view.comments
            .into_iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| DomainError::Internal("saved comment missing from post".into()))
    }

    /// Removes a comment. Only the post's author or the comment's author may
    /// do so. Returns the updated post.
    pub async fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        user_id: Uuid,
    ) -> Result<PostView> {
        const MALFORMED: &str = "Invalid postId or commentId format";
        let post_id = parse_id(post_id, MALFORMED)?;
        let comment_id = parse_id(comment_id, MALFORMED)?;

        let (saved, ()) = self
            .update_post(post_id, |post| {
                let comment = post
                    .comment(comment_id)
                    .ok_or_else(|| DomainError::NotFound("Comment not found".into()))?;
                if !post.may_delete(comment, user_id) {
                    return Err(DomainError::Forbidden(
                        "Unauthorized to delete this comment".into(),
                    ));
                }
                post.remove_comment(comment_id);
                Ok(())
            })
            .await?;
        info!(%post_id, %comment_id, %user_id, "comment deleted");

        populate(self.users.as_ref(), saved).await
    }

    /// Reads the post, applies `apply`, and saves it, retrying from a fresh
    /// read when another writer got there first.
    async fn update_post<T>(
        &self,
        post_id: Uuid,
        mut apply: impl FnMut(&mut Post) -> Result<T> + Send,
    ) -> Result<(Post, T)> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut post = self
                .posts
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| DomainError::NotFound("post not found".into()))?;

            let out = apply(&mut post)?;

            match self.posts.save(post).await {
                Ok(saved) => return Ok((saved, out)),
                Err(DomainError::VersionConflict) => {
                    debug!(%post_id, attempt, "stale post version, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(%post_id, "gave up after {MAX_WRITE_ATTEMPTS} conflicting writes");
        Err(DomainError::VersionConflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use domains::{Analysis, MockContentFilter, MockPostRepository, MockUserRepository};
    use mockall::predicate::eq;
    use std::collections::HashMap;

    fn service(
        posts: MockPostRepository,
        users: MockUserRepository,
        filter: MockContentFilter,
    ) -> CommentService {
        CommentService::new(Arc::new(posts), Arc::new(users), Arc::new(filter))
    }

    fn clean_filter() -> MockContentFilter {
        let mut filter = MockContentFilter::new();
        filter.expect_analyze().returning(|_| Ok(Analysis::clean()));
        filter
    }

    fn bump(mut post: Post) -> Result<Post> {
        post.version += 1;
        Ok(post)
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_before_anything_else() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().never();
        let mut filter = MockContentFilter::new();
        filter.expect_analyze().never();

        let svc = service(posts, MockUserRepository::new(), filter);
        let post_id = Uuid::now_v7().to_string();

        for text in ["", " ", "\t\n", "   \r\n  "] {
            let err = svc.add_comment(&post_id, Uuid::now_v7(), text).await;
            assert!(matches!(err, Err(DomainError::Validation(_))), "{text:?}");
        }
    }

    #[tokio::test]
    async fn test_malformed_post_id() {
        let svc = service(
            MockPostRepository::new(),
            MockUserRepository::new(),
            MockContentFilter::new(),
        );
        let err = svc.add_comment("12345", Uuid::now_v7(), "hi").await;
        assert!(matches!(err, Err(DomainError::InvalidId(m)) if m == "Invalid postId format"));
    }

    #[tokio::test]
    async fn test_flagged_text_never_touches_post() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().never();
        posts.expect_save().never();

        let mut filter = MockContentFilter::new();
        filter
            .expect_analyze()
            .withf(|text: &str| text == "you idiot")
            .returning(|_| Ok(Analysis::with_tags(vec!["insult".into(), "toxic".into()])));

        let err = service(posts, MockUserRepository::new(), filter)
            .add_comment(&Uuid::now_v7().to_string(), Uuid::now_v7(), "  you idiot ")
            .await;

        match err {
            Err(DomainError::Moderation { message, analysis }) => {
                assert_eq!(message, "Comment contains offensive language: insult, toxic");
                assert_eq!(analysis.tags.len(), 2);
            }
            other => panic!("expected moderation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_comment_returns_populated_comment() {
        let alice = fixtures::user("alice");
        let alice_id = alice.id;
        let post = Post::new(Uuid::now_v7(), "hello".into());
        let post_id = post.id;

        let mut posts = MockPostRepository::new();
        let stored = post.clone();
        posts
            .expect_find_by_id()
            .with(eq(post_id))
            .returning(move |_| Ok(Some(stored.clone())));
        posts
            .expect_save()
            .withf(|p| p.comments.len() == 1 && p.version == 0)
            .times(1)
            .returning(bump);

        let mut users = MockUserRepository::new();
        users
            .expect_usernames()
            .returning(move |_| Ok(HashMap::from([(alice_id, "alice".to_string())])));

        let comment = service(posts, users, clean_filter())
            .add_comment(&post_id.to_string(), alice_id, "welcome!")
            .await
            .unwrap();

        assert_eq!(comment.text, "welcome!");
        assert_eq!(comment.commentor.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_add_comment_missing_post() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|_| Ok(None));

        let err = service(posts, MockUserRepository::new(), clean_filter())
            .add_comment(&Uuid::now_v7().to_string(), Uuid::now_v7(), "hi")
            .await;
        assert!(matches!(err, Err(DomainError::NotFound(m)) if m == "post not found"));
    }

    #[tokio::test]
    async fn test_add_comment_retries_on_version_conflict() {
        let post = Post::new(Uuid::now_v7(), "hello".into());
        let post_id = post.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .times(2)
            .returning(move |_| Ok(Some(post.clone())));
        let mut calls = 0;
        posts.expect_save().times(2).returning(move |p| {
            calls += 1;
            if calls == 1 {
                Err(DomainError::VersionConflict)
            } else {
                bump(p)
            }
        });

        let mut users = MockUserRepository::new();
        users.expect_usernames().returning(|_| Ok(HashMap::new()));

        let comment = service(posts, users, clean_filter())
            .add_comment(&post_id.to_string(), Uuid::now_v7(), "hi")
            .await
            .unwrap();
        assert_eq!(comment.text, "hi");
    }

    #[tokio::test]
    async fn test_add_comment_gives_up_after_max_attempts() {
        let post = Post::new(Uuid::now_v7(), "hello".into());
        let post_id = post.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .times(MAX_WRITE_ATTEMPTS)
            .returning(move |_| Ok(Some(post.clone())));
        posts
            .expect_save()
            .times(MAX_WRITE_ATTEMPTS)
            .returning(|_| Err(DomainError::VersionConflict));

        let err = service(posts, MockUserRepository::new(), clean_filter())
            .add_comment(&post_id.to_string(), Uuid::now_v7(), "hi")
            .await;
        assert!(matches!(err, Err(DomainError::VersionConflict)));
    }

    fn post_with_comment(post_author: Uuid, commentor: Uuid) -> (Post, Uuid) {
        let mut post = Post::new(post_author, "hello".into());
        let comment_id = post.push_comment(commentor, "a comment".into()).id;
        (post, comment_id)
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_forbidden() {
        let (post, comment_id) = post_with_comment(Uuid::now_v7(), Uuid::now_v7());
        let post_id = post.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(post.clone())));
        posts.expect_save().never();

        let err = service(posts, MockUserRepository::new(), MockContentFilter::new())
            .delete_comment(&post_id.to_string(), &comment_id.to_string(), Uuid::now_v7())
            .await;
        assert!(matches!(err, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_post_author_and_commentor() {
        let post_author = Uuid::now_v7();
        let commentor = Uuid::now_v7();

        for actor in [post_author, commentor] {
            let (post, comment_id) = post_with_comment(post_author, commentor);
            let post_id = post.id;

            let mut posts = MockPostRepository::new();
            posts
                .expect_find_by_id()
                .returning(move |_| Ok(Some(post.clone())));
            posts
                .expect_save()
                .withf(|p| p.comments.is_empty())
                .times(1)
                .returning(bump);

            let mut users = MockUserRepository::new();
            users.expect_usernames().returning(|_| Ok(HashMap::new()));

            let updated = service(posts, users, MockContentFilter::new())
                .delete_comment(&post_id.to_string(), &comment_id.to_string(), actor)
                .await
                .unwrap();
            assert!(updated.comments.is_empty());
            assert_eq!(updated.version, 1);
        }
    }

    #[tokio::test]
    async fn test_delete_missing_comment() {
        let (post, _) = post_with_comment(Uuid::now_v7(), Uuid::now_v7());
        let post_id = post.id;
        let author = post.author;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(post.clone())));
        posts.expect_save().never();

        let err = service(posts, MockUserRepository::new(), MockContentFilter::new())
            .delete_comment(&post_id.to_string(), &Uuid::now_v7().to_string(), author)
            .await;
        assert!(matches!(err, Err(DomainError::NotFound(m)) if m == "Comment not found"));
    }

    #[tokio::test]
    async fn test_delete_rejects_either_malformed_id() {
        let svc = service(
            MockPostRepository::new(),
            MockUserRepository::new(),
            MockContentFilter::new(),
        );
        let good = Uuid::now_v7().to_string();

        for (p, c) in [("bad", good.as_str()), (good.as_str(), "bad"), ("bad", "bad")] {
            let err = svc.delete_comment(p, c, Uuid::now_v7()).await;
            assert!(matches!(err, Err(DomainError::InvalidId(_))));
        }
    }
}
