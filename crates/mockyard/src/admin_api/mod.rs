//! Admin REST API for inspecting and driving the mock engine.
//!
//! This module provides endpoints for:
//! - Listing routes, variants and collections
//! - Selecting the active collection and changing the global delay
//! - Setting and restoring route variant overrides
//! - Alerts, reloads, health and metrics
//!
//! The API listens on a configurable port (default: 3110).

mod handlers;
mod router;
mod server;
pub(crate) mod types;

pub use server::{AdminApiServer, AdminState};
