//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces, and the statistics pipeline,
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`stats_event`] - Access event model
//! - [`stats_worker`] - Asynchronous statistics worker
//!
//! # Stats Processing Flow
//!
//! 1. The redirect resolver serves a URL
//! 2. A [`stats_event::StatsEvent`] is sent to the bounded channel
//! 3. [`stats_worker::run_stats_worker`] applies it on its own task
//! 4. The counter is incremented via [`repositories::LinkRepository::increment_access`]

pub mod entities;
pub mod repositories;
pub mod stats_event;
pub mod stats_worker;
