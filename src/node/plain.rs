//! The literal nested structure exchanged with the text parsers and printers.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

/// A plain nested structure of scalars, sequences and mappings.
///
/// This is what a parser produces and what a printer consumes. Lists and
/// tuples are kept apart so that a round trip through [`Node`](super::Node)
/// reproduces the original sequence kind; both print as ordinary sequences.
///
/// Mapping equality ignores key order, printing honours it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Plain {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Plain>),
    Tuple(Vec<Plain>),
    Map(IndexMap<String, Plain>),
}

impl Plain {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Plain::Null => "null",
            Plain::Bool(_) => "bool",
            Plain::Int(_) => "int",
            Plain::Float(_) => "float",
            Plain::Str(_) => "str",
            Plain::List(_) => "list",
            Plain::Tuple(_) => "tuple",
            Plain::Map(_) => "mapping",
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Plain>> {
        match self {
            Plain::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<IndexMap<String, Plain>> for Plain {
    fn from(map: IndexMap<String, Plain>) -> Self {
        Plain::Map(map)
    }
}

impl From<bool> for Plain {
    fn from(b: bool) -> Self {
        Plain::Bool(b)
    }
}

impl From<i64> for Plain {
    fn from(i: i64) -> Self {
        Plain::Int(i)
    }
}

impl From<i32> for Plain {
    fn from(i: i32) -> Self {
        Plain::Int(i64::from(i))
    }
}

impl From<f64> for Plain {
    fn from(f: f64) -> Self {
        Plain::Float(f)
    }
}

impl From<&str> for Plain {
    fn from(s: &str) -> Self {
        Plain::Str(s.to_owned())
    }
}

impl From<String> for Plain {
    fn from(s: String) -> Self {
        Plain::Str(s)
    }
}

impl<T: Into<Plain>> From<Vec<T>> for Plain {
    fn from(items: Vec<T>) -> Self {
        Plain::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Plain>> From<Option<T>> for Plain {
    fn from(value: Option<T>) -> Self {
        value.map_or(Plain::Null, Into::into)
    }
}

impl Serialize for Plain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Plain::Null => serializer.serialize_unit(),
            Plain::Bool(b) => serializer.serialize_bool(*b),
            Plain::Int(i) => serializer.serialize_i64(*i),
            Plain::Float(f) => serializer.serialize_f64(*f),
            Plain::Str(s) => serializer.serialize_str(s),
            Plain::List(items) | Plain::Tuple(items) => serializer.collect_seq(items),
            Plain::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Plain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PlainVisitor)
    }
}

struct PlainVisitor;

impl<'de> Visitor<'de> for PlainVisitor {
    type Value = Plain;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Plain, E> {
        Ok(Plain::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Plain, E> {
        Ok(Plain::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Plain, E> {
        // Integers beyond i64 degrade to floats rather than failing the load.
        Ok(i64::try_from(v).map_or(Plain::Float(v as f64), Plain::Int))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Plain, E> {
        Ok(Plain::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Plain, E> {
        Ok(Plain::Str(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Plain, E> {
        Ok(Plain::Str(v))
    }

    fn visit_unit<E>(self) -> Result<Plain, E> {
        Ok(Plain::Null)
    }

    fn visit_none<E>(self) -> Result<Plain, E> {
        Ok(Plain::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Plain, D::Error> {
        Plain::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Plain, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Plain::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Plain, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(key) = access.next_key::<Plain>()? {
            let key = scalar_key(key).map_err(<A::Error as de::Error>::custom)?;
            let value = access.next_value()?;
            map.insert(key, value);
        }
        Ok(Plain::Map(map))
    }
}

/// Mapping keys are text; scalar keys such as `1:` or `true:` are stringified.
fn scalar_key(key: Plain) -> Result<String, String> {
    match key {
        Plain::Str(s) => Ok(s),
        Plain::Int(i) => Ok(i.to_string()),
        Plain::Float(f) => Ok(f.to_string()),
        Plain::Bool(b) => Ok(b.to_string()),
        Plain::Null => Ok("null".to_owned()),
        other => Err(format!("unsupported {} mapping key", other.kind_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_scalars_and_nesting() {
        let plain: Plain = serde_yaml::from_str("a: 1\nb: [x, 2.5]\nc:\n  d: null\n").unwrap();
        let map = plain.as_map().unwrap();
        assert_eq!(map["a"], Plain::Int(1));
        assert_eq!(
            map["b"],
            Plain::List(vec![Plain::Str("x".into()), Plain::Float(2.5)])
        );
        assert_eq!(map["c"].as_map().unwrap()["d"], Plain::Null);
    }

    #[test]
    fn test_numeric_keys_are_stringified() {
        let plain: Plain = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let keys: Vec<_> = plain.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["1", "true"]);
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a: Plain = serde_yaml::from_str("x: 1\ny: 2\n").unwrap();
        let b: Plain = serde_yaml::from_str("y: 2\nx: 1\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tuple_prints_as_sequence() {
        let mut map = IndexMap::new();
        map.insert("t".to_owned(), Plain::Tuple(vec![Plain::Int(1), Plain::Int(2)]));
        let text = serde_yaml::to_string(&Plain::Map(map)).unwrap();
        assert_eq!(text, "t:\n- 1\n- 2\n");
    }
}
