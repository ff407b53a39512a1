//! # campusnet
//!
//! Server entry point: loads configuration, wires the adapters behind the
//! domain ports and serves the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use auth_adapters::{Argon2Hasher, JwtIssuer};
use configs::{LogFormat, ModerationMode, ModerationSettings, Settings};
use domains::{ContentFilter, PostRepository, UserRepository};
use storage_adapters::{MemoryStore, WordListFilter};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings);

    let (users, posts) = build_stores(&settings).await?;
    let filter = build_filter(&settings.moderation)?;
    let tokens = JwtIssuer::new(
        &settings.auth.jwt_secret,
        chrono::Duration::hours(settings.auth.token_ttl_hours),
    );

    let state = Arc::new(AppState::new(
        users,
        posts,
        filter,
        Arc::new(Argon2Hasher::new()),
        Arc::new(tokens),
        settings.auth.cookie_secure,
    ));
    let app = router(state);

    let address = settings.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "campusnet listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

type Stores = (Arc<dyn UserRepository>, Arc<dyn PostRepository>);

async fn build_stores(settings: &Settings) -> anyhow::Result<Stores> {
    match &settings.database.url {
        #[cfg(feature = "db-postgres")]
        Some(url) => {
            use secrecy::ExposeSecret;

            let store = storage_adapters::PgStore::connect(
                url.expose_secret(),
                settings.database.max_connections,
            )
            .await
            .context("connecting to postgres")?;
            info!("using postgres store");
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        #[cfg(not(feature = "db-postgres"))]
        Some(_) => anyhow::bail!("database.url is set but postgres support is not compiled in"),
        None => {
            warn!("database.url not set; data lives in memory only");
            let store = MemoryStore::new();
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
    }
}

fn build_filter(settings: &ModerationSettings) -> anyhow::Result<Arc<dyn ContentFilter>> {
    match settings.mode {
        ModerationMode::Wordlist => {
            let mut filter = match &settings.words_file {
                Some(path) => WordListFilter::from_file(path)?,
                None => WordListFilter::new(std::iter::empty::<&str>()),
            };
            filter.extend(&settings.words);
            if filter.is_empty() {
                warn!("content filter has no blocked words");
            }
            info!(words = filter.len(), "word-list content filter");
            Ok(Arc::new(filter))
        }
        #[cfg(feature = "filter-http")]
        ModerationMode::Http => {
            let url = settings
                .url
                .clone()
                .context("moderation.url is required in http mode")?;
            info!(%url, "http content filter");
            let filter = storage_adapters::HttpContentFilter::new(
                url,
                std::time::Duration::from_secs(settings.timeout_secs),
            )?;
            Ok(Arc::new(filter))
        }
        #[cfg(not(feature = "filter-http"))]
        ModerationMode::Http => {
            anyhow::bail!("moderation.mode = \"http\" but the http filter is not compiled in")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
