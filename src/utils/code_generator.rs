//! Short code generation and validation utilities.
//!
//! Random codes are drawn from the URL-safe base64 alphabet
//! (`A-Z a-z 0-9 - _`) using the operating system's CSPRNG, so they cannot be
//! enumerated by predicting the generator.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Default length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Allowed range for generated code length.
pub const MIN_GENERATED_LENGTH: usize = 6;
pub const MAX_GENERATED_LENGTH: usize = 10;

/// Allowed range for custom alias length.
pub const MIN_CUSTOM_LENGTH: usize = 3;
pub const MAX_CUSTOM_LENGTH: usize = 20;

/// Reserved codes that cannot be used as short links.
///
/// These shadow top-level routes and would be unreachable as redirects.
pub const RESERVED_CODES: &[&str] = &["api", "health", "admin", "static"];

/// A source of candidate short codes.
///
/// The uniqueness arbiter asks for a fresh candidate after every collision.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> Result<String, AppError>;
}

/// [`CodeSource`] backed by [`generate_code`].
#[derive(Debug, Clone, Copy)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_GENERATED_LENGTH, MAX_GENERATED_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeSource for RandomCodeGenerator {
    fn next_code(&self) -> Result<String, AppError> {
        generate_code(self.length)
    }
}

/// Generates a cryptographically secure random short code of `length` chars.
///
/// Reads just enough random bytes to cover `length * 6` bits, encodes them as
/// URL-safe base64 without padding, and keeps the first `length` characters.
/// Every kept character is backed by six full random bits, so each position
/// is uniform over the 64-symbol alphabet.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random source fails.
pub fn generate_code(length: usize) -> Result<String, AppError> {
    let byte_len = (length * 6).div_ceil(8);
    let mut buffer = vec![0u8; byte_len];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buffer);
    code.truncate(length);

    Ok(code)
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Cannot be a reserved system code
///
/// Case is preserved and significant: `MyLink` and `mylink` are different codes.
///
/// # Errors
///
/// Returns [`AppError::InvalidCode`] if any rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    let len = code.chars().count();
    if !(MIN_CUSTOM_LENGTH..=MAX_CUSTOM_LENGTH).contains(&len) {
        return Err(AppError::invalid_code(
            "Custom code must be 3-20 characters",
            json!({ "provided_length": len }),
        ));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::invalid_code(
            "Custom code can only contain letters, digits, hyphens and underscores",
            json!({ "code": code }),
        ));
    }

    if RESERVED_CODES.contains(&code) {
        return Err(AppError::invalid_code(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
