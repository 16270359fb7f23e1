//! Core domain entities.
//!
//! Entities are plain data structures without infrastructure concerns.
//!
//! # Entity Types
//!
//! - [`Link`] - A short code mapped to a destination URL
//! - [`ApiToken`] - A hashed bearer token identifying a principal
//!
//! Creation and partial updates use dedicated input types ([`NewLink`],
//! [`LinkPatch`]).

pub mod api_token;
pub mod link;

pub use api_token::{ApiToken, Principal};
pub use link::{Link, LinkPatch, NewLink};
