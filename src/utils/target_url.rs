//! Target URL validation.
//!
//! Accepted targets are stored exactly as submitted; validation only decides
//! whether a string may become a redirect target.

use url::Url;

/// Upper bound on stored target length in bytes.
pub const MAX_TARGET_LENGTH: usize = 2048;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum TargetUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must contain a host")]
    MissingHost,

    #[error("URL must not contain whitespace or control characters")]
    IllegalCharacters,

    #[error("URL is {0} bytes long, the maximum is {MAX_TARGET_LENGTH}")]
    TooLong(usize),
}

/// Checks that `input` is an absolute HTTP(S) URL usable as a redirect target.
///
/// # Rules
///
/// 1. At most [`MAX_TARGET_LENGTH`] bytes
/// 2. No whitespace or control characters anywhere in the string
/// 3. Parses as an absolute URL with scheme `http` or `https`
/// 4. Has a non-empty host
///
/// # Security
///
/// Rejects potentially dangerous protocols like `javascript:`, `data:`, `file:`, etc.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_target_url("https://example.com/a").is_ok());
/// assert!(validate_target_url("javascript:alert(1)").is_err());
/// assert!(validate_target_url("/relative/path").is_err());
/// ```
pub fn validate_target_url(input: &str) -> Result<(), TargetUrlError> {
    if input.len() > MAX_TARGET_LENGTH {
        return Err(TargetUrlError::TooLong(input.len()));
    }

    if input.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TargetUrlError::IllegalCharacters);
    }

    let url = Url::parse(input).map_err(|e| TargetUrlError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(TargetUrlError::UnsupportedProtocol),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(TargetUrlError::MissingHost),
    }
}
