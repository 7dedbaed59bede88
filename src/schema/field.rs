//! Typed field descriptors.

use std::fs;
use std::path::Path;

use crate::node::{Node, Plain, Value};

use super::{Configuration, Schema, SchemaError, Setting};

/// Lazily resolved schema, so schemas can refer to each other.
pub type SchemaRef = fn() -> &'static Schema;

/// A kind of value a field accepts.
#[derive(Debug, Clone)]
pub enum Kind {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Mapping,
    /// A list or a tuple.
    Sequence,
    /// A list whose elements are all of the given kind.
    List(Box<Kind>),
    Tuple,
    Config(SchemaRef),
}

impl Kind {
    pub fn list_of(elem: Kind) -> Self {
        Kind::List(Box::new(elem))
    }

    pub fn name(&self) -> String {
        match self {
            Kind::Any => "any".to_owned(),
            Kind::Bool => "bool".to_owned(),
            Kind::Int => "int".to_owned(),
            Kind::Float => "float".to_owned(),
            Kind::Str => "str".to_owned(),
            Kind::Mapping => "mapping".to_owned(),
            Kind::Sequence => "sequence".to_owned(),
            Kind::List(elem) => format!("list[{}]", elem.name()),
            Kind::Tuple => "tuple".to_owned(),
            Kind::Config(schema) => schema().name().to_owned(),
        }
    }

    pub fn matches(&self, setting: &Setting) -> bool {
        match (self, setting) {
            (Kind::Any, _) => true,
            (Kind::Config(schema), Setting::Config(config)) => config.is_instance_of(schema()),
            (Kind::Sequence, Setting::Configs(_)) => true,
            (Kind::List(elem), Setting::Configs(configs)) => configs
                .iter()
                .all(|config| elem.matches_config(config)),
            (_, Setting::Value(value)) => self.matches_value(value),
            _ => false,
        }
    }

    fn matches_config(&self, config: &Configuration) -> bool {
        match self {
            Kind::Any => true,
            Kind::Config(schema) => config.is_instance_of(schema()),
            _ => false,
        }
    }

    fn matches_value(&self, value: &Value) -> bool {
        match (self, value) {
            (Kind::Any, _)
            | (Kind::Bool, Value::Bool(_))
            | (Kind::Int, Value::Int(_))
            | (Kind::Float, Value::Float(_))
            | (Kind::Str, Value::Str(_))
            | (Kind::Mapping, Value::Node(_))
            | (Kind::Sequence, Value::List(_) | Value::Tuple(_))
            | (Kind::Tuple, Value::Tuple(_)) => true,
            (Kind::List(elem), Value::List(items)) => items.iter().all(|i| elem.matches_value(i)),
            _ => false,
        }
    }

    /// Builds a value of this kind from `setting`.
    pub fn coerce(&self, field: &'static str, setting: Setting) -> Result<Setting, SchemaError> {
        let found = setting.kind_name();
        let fail = |reason: String| SchemaError::Coercion {
            field,
            found,
            reason,
        };

        match (self, setting) {
            (Kind::Config(schema), Setting::Value(Value::Node(node))) => {
                Configuration::from_node(schema(), &node)
                    .map(Setting::Config)
                    .map_err(|source| SchemaError::Subconfig {
                        field,
                        source: Box::new(source),
                    })
            }
            (Kind::List(elem), setting) if matches!(**elem, Kind::Config(_)) => {
                let items = match setting {
                    Setting::Value(Value::List(items) | Value::Tuple(items)) => items,
                    Setting::Configs(_) => {
                        return Err(fail(format!("elements are not {}", elem.name())))
                    }
                    _ => return Err(fail(format!("expected a sequence of {}", elem.name()))),
                };
                let mut configs = Vec::with_capacity(items.len());
                for (idx, item) in items.into_iter().enumerate() {
                    match elem.coerce(field, Setting::Value(item))? {
                        Setting::Config(config) => configs.push(config),
                        _ => return Err(fail(format!("element {idx} is not {}", elem.name()))),
                    }
                }
                Ok(Setting::Configs(configs))
            }
            (Kind::Mapping, Setting::Config(config)) => Ok(Setting::Value(Value::Node(config.to_node()?))),
            (_, Setting::Value(value)) => self.coerce_value(value).map(Setting::Value).map_err(fail),
            (kind, _) => Err(fail(format!("no conversion to {}", kind.name()))),
        }
    }

    fn coerce_value(&self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (Kind::Any, value) => Ok(value),
            (Kind::Str, Value::Int(i)) => Ok(Value::Str(i.to_string())),
            (Kind::Str, Value::Float(f)) => Ok(Value::Str(f.to_string())),
            (Kind::Str, Value::Bool(b)) => Ok(Value::Str(b.to_string())),
            (Kind::Int, Value::Str(s)) => parse_int(&s).map(Value::Int),
            (Kind::Int, Value::Float(f)) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
            (Kind::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            (Kind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (Kind::Float, Value::Str(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("{s:?}: {e}")),
            (Kind::Bool, Value::Str(s)) => parse_bool(&s).map(Value::Bool),
            (Kind::Bool, Value::Int(i)) => Ok(Value::Bool(i != 0)),
            (Kind::Mapping, Value::List(items) | Value::Tuple(items)) => {
                pairs_to_node(items).map(Value::Node)
            }
            (Kind::Tuple, Value::List(items)) => Ok(Value::Tuple(items)),
            (Kind::List(elem), Value::List(items) | Value::Tuple(items)) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    if elem.matches_value(&item) {
                        Ok(item)
                    } else {
                        elem.coerce_value(item)
                            .map_err(|reason| format!("element {idx}: {reason}"))
                    }
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (kind, value) => Err(format!(
                "no conversion from {} to {}",
                value.kind_name(),
                kind.name()
            )),
        }
    }
}

fn parse_int(s: &str) -> Result<i64, String> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("{s:?} is not an integer"));
    }
    trimmed.parse::<i64>().map_err(|e| format!("{s:?}: {e}"))
}

fn parse_bool(s: &str) -> Result<bool, String> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("{s:?} is not a boolean"))
    }
}

fn pairs_to_node(items: Vec<Value>) -> Result<Node, String> {
    let mut pairs = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::List(mut pair) | Value::Tuple(mut pair) if pair.len() == 2 => {
                let value = pair.pop().unwrap_or_default();
                match pair.pop() {
                    Some(Value::Str(key)) => pairs.push((key, value)),
                    _ => return Err(format!("element {idx} has a non-text key")),
                }
            }
            _ => return Err(format!("element {idx} is not a key/value pair")),
        }
    }
    Ok(Node::from_pairs(pairs))
}

/// Default of a field. `NoDefault` is distinct from a null default.
///
/// Defaults are kept as plain data so schemas can live in statics; every
/// configuration gets its own copy, validated like any other write.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldDefault {
    #[default]
    NoDefault,
    Value(Plain),
}

/// File-system checks applied to a text-valued field on every write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathPolicy {
    /// The path must exist.
    pub exists: bool,
    /// The path must be a directory.
    pub is_dir: bool,
    /// Create the directory (and its ancestors) when missing.
    pub create: bool,
}

impl PathPolicy {
    fn apply(&self, setting: &Setting) -> Result<(), SchemaError> {
        let Some(text) = setting.as_str() else {
            return Ok(());
        };
        let path = Path::new(text);
        if self.exists && !path.exists() {
            return Err(SchemaError::PathNotFound(path.to_path_buf()));
        }
        if self.is_dir && !path.is_dir() {
            return Err(SchemaError::NotADirectory(path.to_path_buf()));
        }
        if self.create && !path.exists() {
            fs::create_dir_all(path).map_err(|source| SchemaError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!(path = %path.display(), "created directory");
        }
        Ok(())
    }
}

/// A named, typed slot of a [`Schema`].
///
/// Writes are validated against the accepted kinds, falling back to
/// coercion through the first kind when enabled. Reads fall back to the
/// default.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    kinds: Vec<Kind>,
    coerce: bool,
    default: FieldDefault,
    doc: Option<String>,
    type_descrip: Option<String>,
    path: Option<PathPolicy>,
}

impl Field {
    pub fn new(name: &'static str, kind: Kind) -> Self {
        Self::any_of(name, [kind])
    }

    /// A field accepting any of `kinds`; coercion targets the first one.
    pub fn any_of(name: &'static str, kinds: impl IntoIterator<Item = Kind>) -> Self {
        let kinds: Vec<Kind> = kinds.into_iter().collect();
        assert!(!kinds.is_empty(), "field {name:?} needs at least one kind");
        Self {
            name,
            kinds,
            coerce: false,
            default: FieldDefault::NoDefault,
            doc: None,
            type_descrip: None,
            path: None,
        }
    }

    /// A text field naming a file-system path; coerces by default.
    pub fn path(name: &'static str) -> Self {
        Self {
            coerce: true,
            path: Some(PathPolicy::default()),
            ..Self::new(name, Kind::Str)
        }
    }

    /// A field holding a nested configuration; mappings are coerced by default.
    pub fn subconfig(name: &'static str, schema: SchemaRef) -> Self {
        Self {
            coerce: true,
            ..Self::new(name, Kind::Config(schema))
        }
    }

    #[must_use]
    pub fn with_coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Plain>) -> Self {
        self.default = FieldDefault::Value(default.into());
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn with_type_descrip(mut self, descrip: impl Into<String>) -> Self {
        self.type_descrip = Some(descrip.into());
        self
    }

    #[must_use]
    pub fn with_exists(mut self, exists: bool) -> Self {
        self.path.get_or_insert_with(PathPolicy::default).exists = exists;
        self
    }

    #[must_use]
    pub fn with_is_dir(mut self, is_dir: bool) -> Self {
        self.path.get_or_insert_with(PathPolicy::default).is_dir = is_dir;
        self
    }

    #[must_use]
    pub fn with_create(mut self, create: bool) -> Self {
        self.path.get_or_insert_with(PathPolicy::default).create = create;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    pub fn coerce(&self) -> bool {
        self.coerce
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    pub fn path_policy(&self) -> Option<&PathPolicy> {
        self.path.as_ref()
    }

    pub fn type_descrip(&self) -> String {
        match &self.type_descrip {
            Some(descrip) => descrip.clone(),
            None => self
                .kinds
                .iter()
                .map(Kind::name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// One-line docs are prefixed with the type description.
    pub fn doc(&self) -> Option<String> {
        self.doc.as_ref().map(|doc| {
            if doc.contains('\n') {
                doc.clone()
            } else {
                format!("{}: {doc}", self.type_descrip())
            }
        })
    }

    /// A fresh, not yet validated copy of the default.
    pub(crate) fn default_setting(&self) -> Option<Setting> {
        match &self.default {
            FieldDefault::Value(default) => Some(Setting::Value(Value::from(default.clone()))),
            FieldDefault::NoDefault => None,
        }
    }

    /// Resolves the field on `owner`: the stored value, else the default.
    ///
    /// `Ok(None)` means no value and no default on an owner still being
    /// built; once sealed that is a `MissingField` error.
    pub fn read(&self, owner: &Configuration) -> Result<Option<Setting>, SchemaError> {
        match owner.stored(self.name).cloned().or_else(|| self.default_setting()) {
            None if owner.is_frozen() => Err(SchemaError::MissingField {
                schema: owner.schema().name(),
                field: self.name,
            }),
            resolved => Ok(resolved),
        }
    }

    /// Validates `value` and stores it on `owner`.
    pub fn write(&self, owner: &mut Configuration, value: Setting) -> Result<(), SchemaError> {
        let value = self.validate(value)?;
        owner.store(self.name, value);
        Ok(())
    }

    /// Checks `value` against the accepted kinds and the path policy.
    pub fn validate(&self, value: Setting) -> Result<Setting, SchemaError> {
        if value.is_null() {
            return Ok(value);
        }
        let value = if self.kinds.iter().any(|kind| kind.matches(&value)) {
            value
        } else if self.coerce {
            self.kinds[0].coerce(self.name, value)?
        } else {
            return Err(SchemaError::TypeMismatch {
                field: self.name,
                found: value.kind_name(),
                expected: self.type_descrip(),
            });
        };
        if let Some(policy) = &self.path {
            policy.apply(&value)?;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_matching_kind() {
        let field = Field::new("port", Kind::Int);
        assert_eq!(field.validate(8080.into()).unwrap(), Setting::from(8080));
    }

    #[test]
    fn test_null_bypasses_kind_check() {
        let field = Field::new("port", Kind::Int);
        assert!(field.validate(Value::Null.into()).unwrap().is_null());
    }

    #[test]
    fn test_type_mismatch_without_coercion() {
        let field = Field::any_of("port", [Kind::Int, Kind::Float]);
        let err = field.validate("8080".into()).unwrap_err();
        match err {
            SchemaError::TypeMismatch {
                field,
                found,
                expected,
            } => {
                assert_eq!(field, "port");
                assert_eq!(found, "str");
                assert_eq!(expected, "int, float");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_coercion_through_first_kind() {
        let field = Field::new("port", Kind::Int).with_coerce(true);
        assert_eq!(field.validate("8080".into()).unwrap(), Setting::from(8080));
        assert_eq!(field.validate(2.9.into()).unwrap(), Setting::from(2));

        let err = field.validate("eighty".into()).unwrap_err();
        assert!(matches!(err, SchemaError::Coercion { field: "port", found: "str", .. }));
    }

    #[test]
    fn test_text_coercions() {
        let flag = Field::new("debug", Kind::Bool).with_coerce(true);
        assert_eq!(flag.validate("TRUE".into()).unwrap(), Setting::from(true));
        assert!(flag.validate("maybe".into()).is_err());

        let name = Field::new("name", Kind::Str).with_coerce(true);
        assert_eq!(name.validate(12.into()).unwrap(), Setting::from("12"));
    }

    #[test]
    fn test_list_coercion_is_element_wise() {
        let field = Field::new("ports", Kind::list_of(Kind::Int)).with_coerce(true);
        let input = Value::Tuple(vec![1.into(), "2".into()]);
        assert_eq!(
            field.validate(input.into()).unwrap(),
            Setting::from(vec![Value::Int(1), Value::Int(2)])
        );

        let bad = Value::List(vec![1.into(), "two".into()]);
        let err = field.validate(bad.into()).unwrap_err();
        match err {
            SchemaError::Coercion { reason, .. } => assert!(reason.starts_with("element 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pairs_coerce_to_mapping() {
        let field = Field::new("rename", Kind::Mapping).with_coerce(true);
        let pairs = Value::List(vec![Value::Tuple(vec!["HHID".into(), "household_id".into()])]);
        let node = field.validate(pairs.into()).unwrap();
        assert_eq!(
            node.as_node().unwrap().get("HHID").unwrap(),
            Value::from("household_id")
        );
    }

    #[test]
    fn test_type_descrip_and_doc() {
        let field = Field::any_of("size", [Kind::Int, Kind::Str]).with_doc("how big");
        assert_eq!(field.doc().unwrap(), "int, str: how big");

        let custom = Field::new("size", Kind::Int)
            .with_type_descrip("a count")
            .with_doc("line one\nline two");
        assert_eq!(custom.type_descrip(), "a count");
        assert_eq!(custom.doc().unwrap(), "line one\nline two");
    }

    #[test]
    fn test_path_policy_exists() {
        let field = Field::path("data").with_exists(true);
        let err = field.validate("/nonexistent/dragon/data".into()).unwrap_err();
        assert!(matches!(err, SchemaError::PathNotFound(_)));
    }

    #[test]
    fn test_path_policy_is_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let field = Field::path("data").with_is_dir(true);
        let path = file.path().to_str().unwrap();
        assert!(matches!(
            field.validate(path.into()),
            Err(SchemaError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_path_policy_create() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out/logs");
        let field = Field::path("output").with_create(true);
        field.validate(target.to_str().unwrap().into()).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_path_coerces_non_text() {
        let field = Field::path("data");
        assert_eq!(field.validate(42.into()).unwrap(), Setting::from("42"));
    }
}
