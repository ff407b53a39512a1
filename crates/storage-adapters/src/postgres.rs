//! # PostgreSQL store
//!
//! Maps the document-shaped domain onto two tables. A post's comments live
//! in a single JSONB column, so a post is always read and written whole;
//! the `version` column turns every save into a compare-and-swap.

use std::collections::HashMap;

use async_trait::async_trait;
use domains::{Comment, DomainError, Post, PostRepository, Result, User, UserRepository};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::error;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and brings the schema up to date.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DomainError::internal)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Unique violations become `Conflict`; anything else is logged and
/// surfaced as `Internal` with the driver's message.
fn db_err(err: sqlx::Error) -> DomainError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            let message = match db.constraint() {
                Some("users_username_key") => "username already taken",
                Some("users_email_key") => "email already registered",
                _ => "duplicate key",
            };
            return DomainError::Conflict(message.into());
        }
    }
    error!(error = %err, "database error");
    DomainError::internal(err)
}

fn user_from_row(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        mobile: row.try_get("mobile")?,
        college_name: row.try_get("college_name")?,
        dob: row.try_get("dob")?,
        posts: row.try_get("posts")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn post_from_row(row: &PgRow) -> std::result::Result<Post, sqlx::Error> {
    let comments: Json<Vec<Comment>> = row.try_get("comments")?;
    Ok(Post {
        id: row.try_get("id")?,
        author: row.try_get("author")?,
        text: row.try_get("text")?,
        comments: comments.0,
        created_at: row.try_get("created_at")?,
        version: row.try_get("version")?,
    })
}

const USER_COLUMNS: &str = "id, username, email, password_hash, name, mobile, college_name, dob, posts, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, user: User) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, name, mobile, college_name, dob, posts, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.mobile)
        .bind(&user.college_name)
        .bind(user.dob)
        .bind(&user.posts)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, username FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(rows.into_iter().collect())
    }

    async fn push_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        let done = sqlx::query(
            "UPDATE users SET posts = array_append(posts, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(DomainError::NotFound("user not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert(&self, post: Post) -> Result<Post> {
        sqlx::query(
            "INSERT INTO posts (id, author, text, comments, created_at, version) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(post.id)
        .bind(post.author)
        .bind(&post.text)
        .bind(Json(&post.comments))
        .bind(post.created_at)
        .bind(post.version)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, author, text, comments, created_at, version FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(post_from_row).transpose().map_err(db_err)
    }

    async fn save(&self, mut post: Post) -> Result<Post> {
        let bumped: Option<i64> = sqlx::query_scalar(
            "UPDATE posts SET text = $2, comments = $3, version = version + 1
             WHERE id = $1 AND version = $4
             RETURNING version",
        )
        .bind(post.id)
        .bind(&post.text)
        .bind(Json(&post.comments))
        .bind(post.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(version) = bumped {
            post.version = version;
            return Ok(post);
        }

        // Nothing matched: either the post is gone or someone saved first.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
            .bind(post.id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        if exists {
            Err(DomainError::VersionConflict)
        } else {
            Err(DomainError::NotFound("post not found".into()))
        }
    }
}
