//! Seeds a development database with two users, a post and a comment.
//!
//! Usage: `CAMPUSNET__DATABASE__URL=postgres://... cargo run -p seed`
//! Safe to re-run: existing accounts are logged into instead of recreated.

use std::sync::Arc;

use anyhow::Context;
use auth_adapters::{Argon2Hasher, JwtIssuer};
use chrono::NaiveDate;
use configs::Settings;
use domains::{DomainError, NewUser};
use secrecy::ExposeSecret;
use services::{AuthService, CommentService, PostService};
use storage_adapters::{PgStore, WordListFilter};
use tracing::info;
use uuid::Uuid;

const DEMO_PASSWORD: &str = "campusnet-demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = Settings::load().context("loading configuration")?;
    let url = settings
        .database
        .url
        .as_ref()
        .context("database.url must be set to seed")?;

    let store = PgStore::connect(url.expose_secret(), settings.database.max_connections).await?;
    let users = Arc::new(store.clone());
    let posts = Arc::new(store);
    let filter = Arc::new(WordListFilter::new(settings.moderation.words.iter()));

    let auth = AuthService::new(
        users.clone(),
        Arc::new(Argon2Hasher::new()),
        Arc::new(JwtIssuer::new(
            &settings.auth.jwt_secret,
            chrono::Duration::hours(settings.auth.token_ttl_hours),
        )),
    );
    let post_service = PostService::new(posts.clone(), users.clone(), filter.clone());
    let comment_service = CommentService::new(posts, users, filter);

    let alice = ensure_user(&auth, "alice", "Alice Moreau").await?;
    let bob = ensure_user(&auth, "bob", "Bob Okafor").await?;

    let post = post_service
        .create_post(alice, "Anyone up for a study group before finals?")
        .await?;
    info!(post_id = %post.id, "created post");

    let comment = comment_service
        .add_comment(&post.id.to_string(), bob, "Count me in, library at 6?")
        .await?;
    info!(comment_id = %comment.id, "added comment");

    Ok(())
}

async fn ensure_user(auth: &AuthService, username: &str, name: &str) -> anyhow::Result<Uuid> {
    let email = format!("{username}@campus.example");
    let new_user = NewUser {
        username: username.to_string(),
        email: email.clone(),
        password: DEMO_PASSWORD.to_string(),
        name: name.to_string(),
        mobile: "555-0100".to_string(),
        college_name: "Campus University".to_string(),
        dob: NaiveDate::from_ymd_opt(2003, 4, 12).context("invalid seed date")?,
    };

    match auth.register(new_user).await {
        Ok(profile) => {
            info!(%username, "registered");
            Ok(profile.id)
        }
        Err(DomainError::Conflict(_)) => {
            let session = auth.login(&email, DEMO_PASSWORD).await?;
            info!(%username, "already registered");
            Ok(session.user.id)
        }
        Err(err) => Err(err.into()),
    }
}
