use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NodeError {
    #[error("key not found: {0:?}")]
    KeyNotFound(String),

    #[error("value under {0:?} is not a node")]
    NotANode(String),

    #[error("'Node' object attribute {0:?} is read-only")]
    ReadOnlyAttribute(String),

    #[error("expected a mapping at the top level, found {0}")]
    NotAMapping(&'static str),

    #[error("node contains itself and has no plain form")]
    Cyclic,

    #[error("unsupported operand for combine: non-empty node and {0}")]
    UnsupportedCombine(&'static str),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("file already exists: {0}")]
    FileAlreadyExists(PathBuf),

    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {origin}:\n{diagnostics}")]
    Parse { origin: String, diagnostics: String },

    #[error("failed to serialize: {0}")]
    Serialize(String),
}
