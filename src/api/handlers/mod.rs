//! HTTP request handlers.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod redirect;

pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, get_link_handler, link_stats_handler,
    list_links_handler, search_link_handler, update_link_handler,
};
pub use redirect::redirect_handler;
