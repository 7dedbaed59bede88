//! Nested configuration trees and declarative schemas.
//!
//! - [`Node`]: an auto-vivifying nested mapping with deep freeze, merging
//!   and YAML/TOML load and dump.
//! - [`schema`]: typed field tables that validate, coerce and default the
//!   values of a [`Configuration`] built from plain mappings.
//! - [`Config`]: a builder layering files, text and environment variables
//!   into one node or configuration.

pub mod config;
mod error;
pub mod node;
pub mod schema;
pub mod tables;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use node::{Node, NodeError, NodeState, Plain, Value};
pub use schema::{Configuration, Schema, SchemaError, SchemaType, Setting};
