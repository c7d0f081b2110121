//! Business logic services for the application layer.

pub mod code_arbiter;
pub mod management_service;
pub mod resolution_service;
pub mod shortening_service;

pub use code_arbiter::{ClaimMode, CodeArbiter, CodePolicy};
pub use management_service::ManagementService;
pub use resolution_service::{ClickMode, Resolution, ResolutionService};
pub use shortening_service::ShorteningService;
