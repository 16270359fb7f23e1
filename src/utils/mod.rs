//! Utility functions shared by services, handlers and the admin CLI.
//!
//! - [`code_generator`] - Short code generation and alias validation
//! - [`url_validator`] - Destination URL validation
//! - [`token`] - API token generation and HMAC hashing

pub mod code_generator;
pub mod token;
pub mod url_validator;
