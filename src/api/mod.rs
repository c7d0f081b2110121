//! Thin HTTP adapter over the application services.
//!
//! Handlers parse input, resolve the caller from gateway headers, call one
//! service method and render the result. No business rule lives here.
//!
//! - [`dto`] - JSON request and response shapes
//! - [`handlers`] - One function per endpoint
//! - [`middleware`] - Identity extraction and request tracing
//! - [`routes`] - The `/api` router

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
