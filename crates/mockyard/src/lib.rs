//! Mockyard: an HTTP mock server whose routes answer through selectable
//! variants, grouped into collections that inherit from each other.
//!
//! The [`mock::Mock`] engine can be embedded directly; the binaries wire it
//! to definition files, an HTTP listener and an admin API.

pub mod admin_api;
pub mod alerts;
pub mod config;
pub mod loader;
pub mod metrics;
pub mod mock;
pub mod server;
pub mod variant_handlers;

pub use admin_api::{AdminApiServer, AdminState};
pub use alerts::{Alert, Alerts};
pub use loader::FilesLoader;
pub use mock::{Mock, MockError, MockOptions, MockRequest};
pub use server::MockServer;
pub use variant_handlers::{VariantHandlerKind, VariantHandlerRegistry};
