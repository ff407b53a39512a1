//! # Content filters
//!
//! Two implementations of `ContentFilter`:
//! - [`WordListFilter`]: local, case-insensitive whole-word matching against
//!   a blocklist. Each blocked word found becomes one tag.
//! - [`HttpContentFilter`] (feature `filter-http`): forwards the text to an
//!   external analysis service that answers with `{ "tags": [...] }`.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use domains::{Analysis, ContentFilter, DomainError, Result};
use unicode_segmentation::UnicodeSegmentation;

pub struct WordListFilter {
    words: HashSet<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DomainError::Internal(format!(
                "Failed to load blocked words from {}: {e}",
                path.as_ref().display()
            ))
        })?;

        Ok(Self::new(
            content.lines().filter(|line| !line.trim_start().starts_with('#')),
        ))
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(Self::new(words).words);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Blocked words in `text`, lowercased, in order of first appearance.
    fn matches(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for word in text.unicode_words() {
            let word = word.to_lowercase();
            if self.words.contains(&word) && !found.contains(&word) {
                found.push(word);
            }
        }
        found
    }
}

#[async_trait]
impl ContentFilter for WordListFilter {
    async fn analyze(&self, text: &str) -> Result<Analysis> {
        let tags = self.matches(text);
        if !tags.is_empty() {
            tracing::debug!(?tags, "blocked words found");
        }
        Ok(Analysis::with_tags(tags))
    }
}

#[cfg(feature = "filter-http")]
pub use http::HttpContentFilter;

#[cfg(feature = "filter-http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use domains::{Analysis, ContentFilter, DomainError, Result};
    use serde::Serialize;
    use tracing::error;

    #[derive(Serialize)]
    struct AnalyzeRequest<'a> {
        text: &'a str,
    }

    pub struct HttpContentFilter {
        client: reqwest::Client,
        url: String,
    }

    impl HttpContentFilter {
        pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(DomainError::internal)?;
            Ok(Self { client, url: url.into() })
        }
    }

    #[async_trait]
    impl ContentFilter for HttpContentFilter {
        async fn analyze(&self, text: &str) -> Result<Analysis> {
            let response = self
                .client
                .post(&self.url)
                .json(&AnalyzeRequest { text })
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| {
                    error!(error = %e, url = %self.url, "content filter request failed");
                    DomainError::internal(e)
                })?;

            response.json::<Analysis>().await.map_err(|e| {
                error!(error = %e, "content filter returned an unreadable body");
                DomainError::internal(e)
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};
        use serde::Deserialize;
        use serde_json::{json, Value};

        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Incoming {
            text: String,
        }

        async fn analyze(Json(body): Json<Incoming>) -> Json<Value> {
            if body.text.contains("idiot") {
                Json(json!({ "tags": ["insult"], "score": 0.93 }))
            } else {
                Json(json!({ "tags": [] }))
            }
        }

        /// Serves a stand-in analysis service on an ephemeral port.
        async fn analysis_service() -> String {
            let app = Router::new()
                .route("/analyze", post(analyze))
                .route(
                    "/broken",
                    post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
                )
                .route("/garbled", post(|| async { "definitely not json" }));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{addr}")
        }

        fn filter(base: &str, path: &str) -> HttpContentFilter {
            HttpContentFilter::new(format!("{base}{path}"), Duration::from_secs(5)).unwrap()
        }

        #[tokio::test]
        async fn test_flagged_response_keeps_extra_fields() {
            let base = analysis_service().await;

            let analysis = filter(&base, "/analyze").analyze("you idiot").await.unwrap();
            assert!(analysis.is_flagged());
            assert_eq!(analysis.tags, vec!["insult".to_string()]);
            assert_eq!(analysis.extra.get("score"), Some(&json!(0.93)));
        }

        #[tokio::test]
        async fn test_clean_response() {
            let base = analysis_service().await;

            let analysis = filter(&base, "/analyze").analyze("nice lecture").await.unwrap();
            assert!(!analysis.is_flagged());
            assert!(analysis.extra.is_empty());
        }

        #[tokio::test]
        async fn test_server_error_is_internal() {
            let base = analysis_service().await;

            let err = filter(&base, "/broken").analyze("anything").await.unwrap_err();
            assert!(matches!(err, DomainError::Internal(_)));
        }

        #[tokio::test]
        async fn test_unreadable_body_is_internal() {
            let base = analysis_service().await;

            let err = filter(&base, "/garbled").analyze("anything").await.unwrap_err();
            assert!(matches!(err, DomainError::Internal(_)));
        }
    }
}
