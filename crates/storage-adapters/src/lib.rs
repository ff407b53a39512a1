//! # storage-adapters
//!
//! Outbound adapters: document stores and content filters.

pub mod memory;
pub mod moderation;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "filter-http")]
pub use moderation::HttpContentFilter;
pub use moderation::WordListFilter;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
