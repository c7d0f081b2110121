//! HTTP middleware and extractors.
//!
//! Provides caller identity extraction and request tracing.

pub mod identity;
pub mod tracing;

pub use identity::CurrentIdentity;
