//! service-core: Shared infrastructure for the gateway workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
