//! Prometheus counters for the comment and login flows.

use prometheus_client::encoding::{text::encode, EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum LoginOutcome {
    Success,
    Failure,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LoginLabels {
    pub outcome: LoginOutcome,
}

pub struct Metrics {
    registry: Registry,
    pub comments_added: Counter,
    pub comments_deleted: Counter,
    /// Comments refused by the content filter.
    pub comments_rejected: Counter,
    pub posts_rejected: Counter,
    pub logins: Family<LoginLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("campusnet");
        let comments_added = Counter::default();
        let comments_deleted = Counter::default();
        let comments_rejected = Counter::default();
        let posts_rejected = Counter::default();
        let logins = Family::<LoginLabels, Counter>::default();

        registry.register("comments_added", "Comments added to posts", comments_added.clone());
        registry.register("comments_deleted", "Comments removed from posts", comments_deleted.clone());
        registry.register(
            "comments_rejected",
            "Comments refused by the content filter",
            comments_rejected.clone(),
        );
        registry.register(
            "posts_rejected",
            "Posts refused by the content filter",
            posts_rejected.clone(),
        );
        registry.register("logins", "Login attempts by outcome", logins.clone());

        Self {
            registry,
            comments_added,
            comments_deleted,
            comments_rejected,
            posts_rejected,
            logins,
        }
    }

    pub fn login(&self, outcome: LoginOutcome) {
        self.logins.get_or_create(&LoginLabels { outcome }).inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}
