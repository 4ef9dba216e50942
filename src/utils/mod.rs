//! Utility functions for code generation and input validation.
//!
//! - [`code_generator`] - Short code generation strategies and code policy
//! - [`target_url`] - Target URL validation

pub mod code_generator;
pub mod target_url;
