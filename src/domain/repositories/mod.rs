//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented in `crate::infrastructure::persistence`. Mock implementations
//! are generated with `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - The durable link store
//! - [`TokenRepository`] - API token authentication

pub mod link_repository;
pub mod token_repository;

pub use link_repository::LinkRepository;
pub use token_repository::TokenRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
