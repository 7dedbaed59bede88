//! Loading nodes from text and dumping them back.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::lint::{lint, render};
use super::{Node, NodeError, OnCycle, Plain};

/// Structured-text format understood by [`Node::load_with`] and [`Node::dump_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Toml,
}

impl Format {
    /// `.toml` files are TOML, everything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }

    pub(crate) fn parse(self, text: &str) -> Result<Plain, String> {
        match self {
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(text).map_err(|e| e.message().to_owned()),
        }
    }

    pub(crate) fn print(self, plain: &Plain) -> Result<String, NodeError> {
        match self {
            Format::Yaml => {
                serde_yaml::to_string(plain).map_err(|e| NodeError::Serialize(e.to_string()))
            }
            Format::Toml => {
                toml::to_string_pretty(plain).map_err(|e| NodeError::Serialize(e.to_string()))
            }
        }
    }
}

/// Where [`Node::load`] reads from.
pub enum Source {
    Path(PathBuf),
    Text(String),
    Reader(Box<dyn Read>),
}

impl Source {
    pub fn reader(reader: impl Read + 'static) -> Self {
        Source::Reader(Box::new(reader))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Text containing a line break is document content; anything else is a path.
impl From<&str> for Source {
    fn from(s: &str) -> Self {
        if s.contains('\n') {
            Source::Text(s.to_owned())
        } else {
            Source::Path(PathBuf::from(s))
        }
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        if s.contains('\n') {
            Source::Text(s)
        } else {
            Source::Path(PathBuf::from(s))
        }
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

/// Options for [`Node::load_with`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Format of the source. `None` infers it from a path's extension,
    /// falling back to YAML.
    pub format: Option<Format>,
    /// Freeze the loaded node.
    pub freeze: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            freeze: true,
        }
    }
}

/// Options for [`Node::dump_with`]. Output is block style with two-space indentation.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub format: Format,
    /// Emit a `---` document start marker (YAML only).
    pub explicit_start: bool,
    /// Emit a `...` document end marker (YAML only).
    pub explicit_end: bool,
}

struct SourceText {
    text: String,
    origin: String,
    path: Option<PathBuf>,
}

impl SourceText {
    fn read(source: Source) -> Result<Self, NodeError> {
        match source {
            Source::Path(path) => {
                if !path.exists() {
                    return Err(NodeError::FileNotFound(path));
                }
                let text = fs::read_to_string(&path).map_err(|source| NodeError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(Self {
                    text,
                    origin: path.display().to_string(),
                    path: Some(path),
                })
            }
            Source::Text(text) => Ok(Self {
                text,
                origin: "<text>".to_owned(),
                path: None,
            }),
            Source::Reader(mut reader) => {
                let mut text = String::new();
                reader
                    .read_to_string(&mut text)
                    .map_err(|source| NodeError::Io {
                        path: PathBuf::from("<reader>"),
                        source,
                    })?;
                Ok(Self {
                    text,
                    origin: "<reader>".to_owned(),
                    path: None,
                })
            }
        }
    }
}

impl Node {
    /// Loads a frozen node from a YAML path, YAML text or a reader.
    pub fn load(source: impl Into<Source>) -> Result<Node, NodeError> {
        Self::load_with(source, &LoadOptions::default(), None)
    }

    /// Loads a node with explicit options.
    ///
    /// When `sink` is given, lint findings for a path source are written to
    /// it before parsing. If parsing fails, the source is linted and every
    /// diagnostic line goes to `sink`; without a sink the diagnostics make
    /// up the error message instead.
    pub fn load_with(
        source: impl Into<Source>,
        options: &LoadOptions,
        mut sink: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Node, NodeError> {
        let SourceText { text, origin, path } = SourceText::read(source.into())?;
        let format = options
            .format
            .or_else(|| path.as_deref().map(Format::from_path))
            .unwrap_or_default();

        // Lint findings for a file go to the sink up front, parse errors included.
        let prelinted = path.is_some() && sink.is_some();
        if prelinted {
            if let Some(sink) = sink.as_mut() {
                for line in render(&lint(&origin, &text, format)) {
                    sink(&line);
                }
            }
        }

        let plain = match format.parse(&text) {
            Ok(plain) => plain,
            Err(summary) => {
                let diagnostics = match sink {
                    Some(_) if prelinted => summary,
                    Some(sink) => {
                        for line in render(&lint(&origin, &text, format)) {
                            sink(&line);
                        }
                        summary
                    }
                    None => {
                        let lines = render(&lint(&origin, &text, format));
                        for line in &lines {
                            tracing::warn!(origin = %origin, "{line}");
                        }
                        lines.join("\n")
                    }
                };
                return Err(NodeError::Parse {
                    origin,
                    diagnostics,
                });
            }
        };

        let node = Node::from_plain(plain)?;
        if options.freeze {
            node.freeze(true);
        }
        tracing::debug!(origin = %origin, ?format, keys = node.len(), "loaded node");
        Ok(node)
    }

    /// Serializes to YAML text.
    pub fn dump(&self) -> Result<String, NodeError> {
        self.dump_with(&DumpOptions::default())
    }

    pub fn dump_with(&self, options: &DumpOptions) -> Result<String, NodeError> {
        print_document(&self.to_plain()?, options)
    }

    /// Writes YAML to a new file at `path`.
    pub fn dump_to(&self, path: impl AsRef<Path>) -> Result<(), NodeError> {
        self.dump_to_with(path, &DumpOptions::default())
    }

    /// Writes to a new file at `path`, creating missing parent directories.
    ///
    /// An existing file is never overwritten, including one that appears
    /// while the document is being written.
    pub fn dump_to_with(&self, path: impl AsRef<Path>, options: &DumpOptions) -> Result<(), NodeError> {
        let path = path.as_ref();
        let text = self.dump_with(options)?;

        let io_err = |source| NodeError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(NodeError::FileAlreadyExists(path.to_path_buf()));
            }
            Err(err) => return Err(io_err(err)),
        };
        file.write_all(text.as_bytes()).map_err(io_err)?;
        tracing::debug!(path = %path.display(), format = ?options.format, "dumped node");
        Ok(())
    }
}

fn print_document(plain: &Plain, options: &DumpOptions) -> Result<String, NodeError> {
    let body = options.format.print(plain)?;
    let markers = options.format == Format::Yaml;

    let mut out = String::with_capacity(body.len() + 8);
    if markers && options.explicit_start {
        out.push_str("---\n");
    }
    out.push_str(&body);
    if markers && options.explicit_end {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("...\n");
    }
    Ok(out)
}

/// Cycles print as a marker instead of failing.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = DumpOptions {
            explicit_start: true,
            explicit_end: true,
            ..DumpOptions::default()
        };
        let plain = self
            .plain_with(&mut Vec::new(), OnCycle::Mark)
            .map_err(|_| fmt::Error)?;
        let text = print_document(&plain, &options).map_err(|_| fmt::Error)?;
        f.write_str(text.trim_end_matches('\n'))
    }
}
