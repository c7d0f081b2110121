//! Repository trait definitions for the domain layer.
//!
//! The storage contract is expressed as a trait so the services can run
//! against PostgreSQL, the in-memory store, or a `mockall` mock.
//!
//! Implementations live in `crate::infrastructure::persistence`.

pub mod url_repository;

pub use url_repository::{
    CodeUpdate, DEFAULT_PAGE_SIZE, ListQuery, MAX_PAGE_SIZE, OwnerFilter, SortDir, SortKey,
    UrlRepository, UrlSummary,
};

#[cfg(test)]
pub use url_repository::MockUrlRepository;
