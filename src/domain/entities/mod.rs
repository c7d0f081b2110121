//! Core domain entities.
//!
//! - [`UrlRecord`] - A short code mapped to its original URL
//! - [`Identity`] - The caller on whose behalf an operation runs
//!
//! Creation input uses a separate struct ([`NewUrlRecord`]) so that store-owned
//! fields (`id`, timestamps, counters) can never be supplied by callers.

pub mod identity;
pub mod url_record;

pub use identity::Identity;
pub use url_record::{NewUrlRecord, UrlRecord};
