//! Application layer services implementing business logic.
//!
//! Services coordinate the store, the cache and the stats queue. They consume
//! repository and cache traits so handlers and tests can supply any backend.
//!
//! # Available Services
//!
//! - [`services::redirect_service::RedirectService`] - Cache-aside short code resolution
//! - [`services::link_service::LinkService`] - Link creation, update and deletion
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
