//! File and in-memory configuration sources.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::node::{Format, LoadOptions, Node, Source};

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

fn unfrozen(format: Option<Format>) -> LoadOptions {
    LoadOptions {
        format,
        freeze: false,
    }
}

/// A configuration source that loads from a YAML or TOML file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source. The format follows the file extension.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn entries(&mut self) -> Result<Vec<ConfigEntry>, ConfigError> {
        if !self.path.exists() {
            if self.required {
                return Err(ConfigError::FileNotFound(self.path.clone()));
            }
            tracing::debug!(path = %self.path.display(), "skipping missing optional config file");
            return Ok(vec![]);
        }
        let node = Node::load_with(self.path.as_path(), &unfrozen(None), None)?;
        Ok(vec![ConfigEntry::root(node)])
    }
}

/// Document text held in memory.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    format: Format,
}

impl TextSource {
    pub fn new(text: impl Into<String>, format: Format) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

impl ConfigSource for TextSource {
    fn entries(&mut self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let source = Source::Text(self.text.clone());
        let node = Node::load_with(source, &unfrozen(Some(self.format)), None)?;
        Ok(vec![ConfigEntry::root(node)])
    }
}

/// A document read once from an open reader.
pub struct ReaderSource {
    reader: Option<Box<dyn Read>>,
    format: Format,
}

impl ReaderSource {
    pub fn new(reader: impl Read + 'static, format: Format) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            format,
        }
    }
}

impl fmt::Debug for ReaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSource")
            .field("consumed", &self.reader.is_none())
            .field("format", &self.format)
            .finish()
    }
}

impl ConfigSource for ReaderSource {
    fn entries(&mut self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let Some(reader) = self.reader.take() else {
            return Ok(vec![]);
        };
        let node = Node::load_with(Source::Reader(reader), &unfrozen(Some(self.format)), None)?;
        Ok(vec![ConfigEntry::root(node)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeError, Value};
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_loads_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key: value").unwrap();

        let mut source = FileSource::new(file.path(), true);
        let entries = source.entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.is_empty());
        let node = entries[0].value.as_node().unwrap();
        assert!(!node.is_frozen());
        assert_eq!(node.get("key").unwrap(), Value::from("value"));
    }

    #[test]
    fn test_file_source_reads_toml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "key = \"value\"").unwrap();

        let entries = FileSource::new(file.path(), true).entries().unwrap();
        let node = entries[0].value.as_node().unwrap();
        assert_eq!(node.get("key").unwrap(), Value::from("value"));
    }

    #[test]
    fn test_file_source_required_missing() {
        let mut source = FileSource::new("/nonexistent/path/config.yaml", true);
        let result = source.entries();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_file_source_optional_missing() {
        let mut source = FileSource::new("/nonexistent/path/config.yaml", false);
        let entries = source.entries().unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn test_file_source_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key: [unclosed").unwrap();

        let result = FileSource::new(file.path(), true).entries();
        assert!(matches!(
            result,
            Err(ConfigError::Node(NodeError::Parse { .. }))
        ));
    }

    #[test]
    fn test_text_source_without_line_break() {
        let entries = TextSource::new("key = 1", Format::Toml).entries().unwrap();
        assert_eq!(
            entries[0].value.as_node().unwrap().get("key").unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_reader_source_is_read_once() {
        let mut source = ReaderSource::new(Cursor::new("key: 1\n"), Format::Yaml);
        assert_eq!(source.entries().unwrap().len(), 1);
        assert!(source.entries().unwrap().is_empty());
    }
}
