//! HTTP surface: the public redirect, health, and the token-protected
//! `/api/links` endpoints.
//!
//! - [`dto`] - request and response bodies
//! - [`handlers`] - axum handlers
//! - [`middleware`] - bearer authentication and request tracing
//! - [`routes`] - the protected route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
