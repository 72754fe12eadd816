//! Definition values and schema validation for mockyard.
//!
//! Route, variant and collection definitions are dynamic documents. This crate
//! provides the [`Value`] type they are expressed in and a small JSON-schema
//! validator with one extension, the `instanceof` keyword, used to require a
//! native regular expression or function.
//!
//! # Example
//!
//! ```
//! use mockyard_schema::{CompiledSchema, Value};
//! use serde_json::json;
//!
//! let schema = CompiledSchema::compile(&json!({
//!     "type": "object",
//!     "properties": {"status": {"type": "integer"}},
//!     "required": ["status"]
//! }))
//! .unwrap();
//!
//! assert!(schema.validate(&Value::from(json!({"status": 200}))).is_ok());
//! assert!(schema.validate(&Value::from(json!({}))).is_err());
//! ```

mod schema;
mod types;
mod validator;
mod value;

pub use schema::{CompiledSchema, InstanceKind};
pub use types::{SchemaError, SchemaViolation, ValidationError};
pub use value::{Function, Value};
