//! Adapters behind the domain traits.
//!
//! - [`persistence`] - [`crate::domain::repositories::UrlRepository`] on PostgreSQL or in memory
//! - [`cache`] - Redis resolution cache, or a no-op when disabled

pub mod cache;
pub mod persistence;
