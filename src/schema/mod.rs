//! Declarative schemas over plain nested mappings.
//!
//! A [`Schema`] is a static table of [`Field`]s. Building a
//! [`Configuration`] from keyword values runs in two passes: every supplied
//! value is written through its field, then the object is sealed and every
//! declared field is read back and written again. The second pass applies
//! defaults and fails fast on required fields that never got a value.
//!
//! ```
//! use std::sync::OnceLock;
//! use dragon_cfg::schema::{Configuration, Field, Kind, Schema};
//!
//! fn server() -> &'static Schema {
//!     static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!     SCHEMA.get_or_init(|| {
//!         Schema::builder("Server")
//!             .field(Field::new("host", Kind::Str))
//!             .field(Field::new("port", Kind::Int).with_coerce(true).with_default(80))
//!             .build()
//!     })
//! }
//!
//! let config = Configuration::new(server(), [("host", "localhost")])?;
//! assert_eq!(config.get("port")?.as_int(), Some(80));
//! # Ok::<(), dragon_cfg::schema::SchemaError>(())
//! ```

mod error;
mod field;
mod setting;

use std::fmt;
use std::ptr;

use indexmap::IndexMap;

use crate::node::{Node, Plain, Source};

pub use error::SchemaError;
pub use field::{Field, FieldDefault, Kind, PathPolicy, SchemaRef};
pub use setting::Setting;

/// A named, ordered table of fields.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            name,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Unpacks the top level of `node` as keyword fields.
    pub fn from_node(&'static self, node: &Node) -> Result<Configuration, SchemaError> {
        Configuration::from_node(self, node)
    }

    /// Loads a single source and builds a configuration from it.
    ///
    /// Use [`Config`](crate::Config) to layer several sources.
    pub fn load(&'static self, source: impl Into<Source>) -> Result<Configuration, SchemaError> {
        let node = Node::load(source)?;
        Configuration::from_node(self, &node)
    }
}

#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct SchemaBuilder {
    name: &'static str,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Declares a field. Declaration order is the sealing order.
    pub fn field(mut self, field: Field) -> Self {
        assert!(
            self.fields.iter().all(|f| f.name() != field.name()),
            "field {:?} declared twice on {}",
            field.name(),
            self.name
        );
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// An instance of a [`Schema`].
///
/// Once constructed the field set is fixed: writing an undeclared name
/// fails, while declared fields stay writable through their validation.
#[derive(Debug, Clone)]
pub struct Configuration {
    schema: &'static Schema,
    values: IndexMap<&'static str, Setting>,
    frozen: bool,
}

impl Configuration {
    /// Builds and seals a configuration from keyword values.
    pub fn new<I, K, V>(schema: &'static Schema, kwargs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Setting>,
    {
        let mut config = Self {
            schema,
            values: IndexMap::new(),
            frozen: false,
        };

        for (name, value) in kwargs {
            let name = name.as_ref();
            let field = schema.field(name).ok_or_else(|| SchemaError::UnknownField {
                schema: schema.name,
                field: name.to_owned(),
            })?;
            field.write(&mut config, value.into())?;
        }

        config.frozen = true;
        for field in &schema.fields {
            if let Some(value) = field.read(&config)? {
                field.write(&mut config, value)?;
            }
        }

        tracing::debug!(schema = schema.name, fields = schema.fields.len(), "sealed configuration");
        Ok(config)
    }

    /// Unpacks the top level of `node` as keyword fields.
    pub fn from_node(schema: &'static Schema, node: &Node) -> Result<Self, SchemaError> {
        Self::new(schema, node.entries())
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn is_instance_of(&self, schema: &Schema) -> bool {
        ptr::eq(self.schema, schema)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Reads a declared field. Defaults were stored when the object was sealed.
    pub fn get(&self, name: &str) -> Result<&Setting, SchemaError> {
        let field = self.declared(name)?;
        self.values
            .get(field.name())
            .ok_or(SchemaError::MissingField {
                schema: self.schema.name,
                field: field.name(),
            })
    }

    /// Writes a declared field through its validation.
    pub fn set(&mut self, name: &str, value: impl Into<Setting>) -> Result<(), SchemaError> {
        let schema = self.schema;
        match schema.field(name) {
            Some(field) => field.write(self, value.into()),
            None if self.frozen => Err(SchemaError::Immutable(name.to_owned())),
            None => Err(SchemaError::UnknownField {
                schema: schema.name,
                field: name.to_owned(),
            }),
        }
    }

    /// Drops the stored value and writes the field's default again, if any.
    pub fn reset(&mut self, name: &str) -> Result<(), SchemaError> {
        let field = self.declared(name)?;
        self.values.shift_remove(field.name());
        match field.default_setting() {
            Some(default) => field.write(self, default),
            None => Ok(()),
        }
    }

    /// Declared fields in order, nested configurations expanded.
    pub fn to_plain(&self) -> Result<Plain, SchemaError> {
        let mut map = IndexMap::with_capacity(self.schema.fields.len());
        for field in &self.schema.fields {
            let value = match field.read(self)? {
                Some(setting) => setting.to_plain()?,
                None => continue,
            };
            map.insert(field.name().to_owned(), value);
        }
        Ok(Plain::Map(map))
    }

    pub fn to_node(&self) -> Result<Node, SchemaError> {
        Ok(Node::from_plain(self.to_plain()?)?)
    }

    fn declared(&self, name: &str) -> Result<&'static Field, SchemaError> {
        let schema = self.schema;
        schema.field(name).ok_or_else(|| SchemaError::UnknownField {
            schema: schema.name,
            field: name.to_owned(),
        })
    }

    pub(crate) fn stored(&self, name: &str) -> Option<&Setting> {
        self.values.get(name)
    }

    pub(crate) fn store(&mut self, name: &'static str, value: Setting) {
        self.values.insert(name, value);
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.schema, other.schema) && self.values == other.values
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.schema.name)
    }
}

/// A typed wrapper around a [`Configuration`] of one schema.
pub trait SchemaType: Sized {
    fn schema() -> &'static Schema;

    /// Wraps a configuration already validated against [`schema`](Self::schema).
    fn from_configuration(config: Configuration) -> Self;

    fn new<I, K, V>(kwargs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Setting>,
    {
        Configuration::new(Self::schema(), kwargs).map(Self::from_configuration)
    }

    fn from_node(node: &Node) -> Result<Self, SchemaError> {
        Configuration::from_node(Self::schema(), node).map(Self::from_configuration)
    }

    fn load(source: impl Into<Source>) -> Result<Self, SchemaError> {
        Self::schema().load(source).map(Self::from_configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Value;
    use std::sync::OnceLock;

    fn server() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Server")
                .field(Field::new("host", Kind::Str))
                .field(Field::new("port", Kind::Int).with_coerce(true).with_default(8080))
                .field(Field::new("label", Kind::Str).with_default(Plain::Null))
                .build()
        })
    }

    fn deployment() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Deployment")
                .field(Field::subconfig("server", server))
                .field(Field::new("replicas", Kind::Int).with_default(1))
                .build()
        })
    }

    #[test]
    fn test_defaults_apply_after_sealing() {
        let config = Configuration::new(server(), [("host", "example.com")]).unwrap();
        assert!(config.is_frozen());
        assert_eq!(config.get("host").unwrap().as_str(), Some("example.com"));
        assert_eq!(config.get("port").unwrap().as_int(), Some(8080));
        assert!(config.get("label").unwrap().is_null());
    }

    #[test]
    fn test_missing_value_surfaces_only_once_sealed() {
        let mut config = Configuration {
            schema: server(),
            values: IndexMap::new(),
            frozen: false,
        };
        let host = server().field("host").unwrap();
        let port = server().field("port").unwrap();
        let label = server().field("label").unwrap();

        assert_eq!(host.read(&config).unwrap(), None);
        assert_eq!(port.read(&config).unwrap(), Some(Setting::from(8080)));
        assert_eq!(label.read(&config).unwrap(), Some(Setting::from(Value::Null)));

        config.frozen = true;
        assert!(matches!(
            host.read(&config),
            Err(SchemaError::MissingField { schema: "Server", field: "host" })
        ));
        assert_eq!(port.read(&config).unwrap(), Some(Setting::from(8080)));
    }

    #[test]
    fn test_missing_required_field_fails_at_sealing() {
        let err = Configuration::new(server(), Vec::<(&str, Setting)>::new()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingField { schema: "Server", field: "host" }
        ));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = Configuration::new(server(), [("host", "a"), ("colour", "blue")]).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { field, .. } if field == "colour"));
    }

    #[test]
    fn test_keyword_values_are_coerced() {
        let kwargs: Vec<(&str, Setting)> = vec![("host", "a".into()), ("port", "9000".into())];
        let config = Configuration::new(server(), kwargs).unwrap();
        assert_eq!(config.get("port").unwrap().as_int(), Some(9000));
    }

    #[test]
    fn test_sealed_shape_but_mutable_fields() {
        let mut config = Configuration::new(server(), [("host", "a")]).unwrap();
        config.set("host", "b").unwrap();
        assert_eq!(config.get("host").unwrap().as_str(), Some("b"));

        assert!(matches!(
            config.set("extra", 1),
            Err(SchemaError::Immutable(name)) if name == "extra"
        ));
        assert!(matches!(
            config.set("host", 5),
            Err(SchemaError::TypeMismatch { field: "host", .. })
        ));
    }

    #[test]
    fn test_reset_restores_default_or_fails() {
        let kwargs: Vec<(&str, Setting)> = vec![("host", "a".into()), ("port", 1.into())];
        let mut config = Configuration::new(server(), kwargs).unwrap();
        config.reset("port").unwrap();
        assert_eq!(config.get("port").unwrap().as_int(), Some(8080));

        config.reset("host").unwrap();
        assert!(matches!(
            config.get("host"),
            Err(SchemaError::MissingField { field: "host", .. })
        ));
    }

    #[test]
    fn test_subconfig_from_mapping() {
        let node = Node::load("server:\n  host: db.local\n  port: '5432'\n").unwrap();
        let config = deployment().from_node(&node).unwrap();

        let server_cfg = config.get("server").unwrap().as_config().unwrap();
        assert!(server_cfg.is_instance_of(server()));
        assert_eq!(server_cfg.get("port").unwrap().as_int(), Some(5432));
        assert_eq!(config.get("replicas").unwrap().as_int(), Some(1));
    }

    #[test]
    fn test_subconfig_failure_is_wrapped() {
        let node = Node::load("server:\n  port: 1\n").unwrap();
        let err = deployment().from_node(&node).unwrap_err();
        match err {
            SchemaError::Subconfig { field, source } => {
                assert_eq!(field, "server");
                assert!(matches!(*source, SchemaError::MissingField { field: "host", .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_subconfig_rejects_wrong_kind() {
        let err = Configuration::new(deployment(), [("server", 3)]).unwrap_err();
        assert!(matches!(err, SchemaError::Coercion { field: "server", .. }));
    }

    #[test]
    fn test_to_node_round_trip() {
        let node = Node::load("server:\n  host: h\nreplicas: 3\n").unwrap();
        let config = deployment().from_node(&node).unwrap();
        let dumped = config.to_node().unwrap();
        assert_eq!(
            dumped.to_plain().unwrap(),
            Node::load("server: {host: h, port: 8080, label: null}\nreplicas: 3\n")
                .unwrap()
                .to_plain()
                .unwrap()
        );
        assert_eq!(deployment().from_node(&dumped).unwrap(), config);
    }

    #[test]
    fn test_display() {
        let config = Configuration::new(server(), [("host", "a")]).unwrap();
        assert_eq!(config.to_string(), "<Server>");
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn test_duplicate_field_panics() {
        let _ = Schema::builder("Dup")
            .field(Field::new("a", Kind::Int))
            .field(Field::new("a", Kind::Str));
    }
}
