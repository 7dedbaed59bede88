use std::io::Read;
use std::path::Path;

use crate::node::{Format, Node};
use crate::schema::{Configuration, Schema, SchemaType};

use super::env::EnvSource;
use super::file::{FileSource, ReaderSource, TextSource};
use super::source::{merge_at_path, ConfigSource};
use super::ConfigError;

/// Builder for loading configuration from several layered sources.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested mappings are merged recursively; other values
/// (including sequences) are replaced entirely.
///
/// ## Example
///
/// ```no_run
/// use dragon_cfg::Config;
/// use dragon_cfg::tables::Settings;
///
/// let settings: Settings = Config::builder()
///     .with_file("config/settings.yaml", true)
///     .with_file("config/local.yaml", false)
///     .with_env("MYAPP", "__")
///     .build()?;
/// # Ok::<(), dragon_cfg::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a YAML or TOML file (chosen by extension) to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds document text held in memory.
    pub fn with_text(self, text: impl Into<String>, format: Format) -> Self {
        self.with_source(TextSource::new(text, format))
    }

    /// Adds a document read from `reader` at build time.
    pub fn with_reader(self, reader: impl Read + 'static, format: Format) -> Self {
        self.with_source(ReaderSource::new(reader, format))
    }

    /// Loads configuration from environment variables with the given prefix.
    ///
    /// Environment variables are mapped to config paths by:
    /// 1. Removing the prefix and separator
    /// 2. Splitting remaining segments on the separator
    /// 3. Converting path segments to lowercase
    ///
    /// Values are coerced from strings to the most specific type:
    /// integer, float, boolean, or string (fallback).
    ///
    /// ```no_run
    /// # use dragon_cfg::Config;
    /// // With MYAPP__DATABASE__HOST=localhost and MYAPP__DATABASE__PORT=5432
    /// let node = Config::builder()
    ///     .with_file("config/default.yaml", true)
    ///     .with_env("MYAPP", "__")
    ///     .build_node()?;
    /// assert_eq!(node.child("database")?.get("port")?, 5432.into());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds any other source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Loads and merges every source into one frozen node.
    pub fn build_node(self) -> Result<Node, ConfigError> {
        let merged = Node::new();

        for mut source in self.sources {
            let entries = source.entries()?;
            tracing::debug!(?source, entries = entries.len(), "merging config source");
            for entry in entries {
                merge_at_path(&merged, &entry.path, entry.value)?;
            }
        }

        merged.freeze(true);
        Ok(merged)
    }

    /// Loads, merges and validates against `schema`.
    pub fn build_schema(self, schema: &'static Schema) -> Result<Configuration, ConfigError> {
        let node = self.build_node()?;
        Ok(Configuration::from_node(schema, &node)?)
    }

    /// Loads, merges and validates into a typed schema wrapper.
    pub fn build<T: SchemaType>(self) -> Result<T, ConfigError> {
        Ok(T::from_node(&self.build_node()?)?)
    }
}
