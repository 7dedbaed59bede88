use std::path::PathBuf;
use thiserror::Error;

use crate::node::NodeError;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to load config source: {0}")]
    Node(#[from] NodeError),

    #[error("invalid configuration: {0}")]
    Schema(#[from] SchemaError),
}
