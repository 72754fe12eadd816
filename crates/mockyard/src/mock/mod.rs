//! Mock resolution and dispatch engine.
//!
//! This module provides:
//! - `Mock`: the engine holding routes, collections and overrides
//! - `MockRequest`: the request view handed to variant handlers
//! - listing types for the administrative surface
//!
//! ## Module Structure
//!
//! - `types`: type definitions (live entities, summaries, errors)
//! - `path`: route url matching
//! - `catalog`: definition schemas compiled for a handler registry
//! - `routes`: building routes and variants
//! - `collections`: building and resolving collections
//! - `overrides`: runtime variant overrides
//! - `model`: the immutable model swapped on every load
//! - `dispatch`: per-request dispatch
//! - `core`: the `Mock` engine

mod catalog;
mod collections;
mod core;
mod dispatch;
mod model;
mod overrides;
mod path;
mod request;
mod routes;
mod types;

#[cfg(test)]
mod tests;

pub use core::Mock;
pub use overrides::Overrides;
pub use path::{PathMatch, PathMatcher};
pub use request::MockRequest;
pub use types::{
    composite_id, Collection, CollectionSummary, DispatchOutcome, LoadSummary, MockError,
    MockOptions, Route, RouteSummary, Unhandled, Variant, VariantSummary, METHODS,
};
