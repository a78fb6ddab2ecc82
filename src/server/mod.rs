//! Server module for building HTTP servers with auto-registered query routes
//!
//! This module provides a `ServerBuilder` that registers, for every entity:
//! - GET /{plural} with filter, sort, paging and projection parameters
//! - GET /{plural}/distinct?field=...
//! - GET /{plural}/one
//! - health routes

use tracing_subscriber::EnvFilter;

pub mod builder;
pub mod entity_registry;
pub mod rest;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry, QueryEntityDescriptor};

/// Install a formatting subscriber filtered by `RUST_LOG`, or `default_filter`
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::info!("Tracing initialized");
    }
}
