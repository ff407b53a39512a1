//! # services
//!
//! Use cases for campusnet. Each service holds `Arc<dyn Port>` handles and
//! nothing else; there is no process-wide state.

pub mod auth;
pub mod comments;
pub mod posts;
pub mod profile;

pub use auth::{AuthService, Session};
pub use comments::CommentService;
pub use posts::PostService;
pub use profile::ProfileService;

use domains::{DomainError, Result};
use uuid::Uuid;

/// Parses a path identifier, mapping failure to `InvalidId(message)`.
pub(crate) fn parse_id(raw: &str, message: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::InvalidId(message.to_string()))
}
