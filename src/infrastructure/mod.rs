//! Adapters behind the domain traits.
//!
//! - [`cache`] - [`cache::CacheService`] backends (Redis, in-process, none)
//! - [`persistence`] - PostgreSQL implementations of the repositories

pub mod cache;
pub mod persistence;
