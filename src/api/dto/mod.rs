//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation.

pub mod edit;
pub mod health;
pub mod list;
pub mod shorten;
pub mod summary;
pub mod url_record;
