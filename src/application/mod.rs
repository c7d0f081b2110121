//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume the repository trait and
//! provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::code_arbiter::CodeArbiter`] - Short code claims under concurrency
//! - [`services::shortening_service::ShorteningService`] - Short URL creation
//! - [`services::resolution_service::ResolutionService`] - Redirect lookups and click counting
//! - [`services::management_service::ManagementService`] - Edit, delete, moderation and listing

pub mod services;
