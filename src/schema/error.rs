use std::path::PathBuf;
use thiserror::Error;

use crate::node::NodeError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("{schema} got an unexpected keyword {field:?}")]
    UnknownField { schema: &'static str, field: String },

    #[error("{schema}: {field:?} is not set and has no default")]
    MissingField {
        schema: &'static str,
        field: &'static str,
    },

    #[error("can't set {field:?} with {found}, must be {expected}")]
    TypeMismatch {
        field: &'static str,
        found: &'static str,
        expected: String,
    },

    #[error("for {field:?} can't coerce {found}: {reason}")]
    Coercion {
        field: &'static str,
        found: &'static str,
        reason: String,
    },

    #[error("for {field:?} can't build subconfig: {source}")]
    Subconfig {
        field: &'static str,
        source: Box<SchemaError>,
    },

    #[error("cannot set attribute {0:?}")]
    Immutable(String),

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to create directory '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Node(#[from] NodeError),
}
