use std::collections::HashMap;

use super::{Node, NodeError, OnCycle, Plain};

/// A value stored in a [`Node`].
///
/// Nested mappings are always nodes; sequences keep their list or tuple
/// kind. Cloning a `Value::Node` clones the handle, not the subtree.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Node(Node),
}

pub(crate) type Memo = HashMap<*const (), Node>;

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Node(_) => "node",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a list or a tuple.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Recursively converts into the plain structure, preserving sequence kinds.
    pub fn to_plain(&self) -> Result<Plain, NodeError> {
        self.plain_with(&mut Vec::new(), OnCycle::Fail)
    }

    pub(crate) fn plain_with(
        &self,
        path: &mut Vec<*const ()>,
        on_cycle: OnCycle,
    ) -> Result<Plain, NodeError> {
        Ok(match self {
            Value::Null => Plain::Null,
            Value::Bool(b) => Plain::Bool(*b),
            Value::Int(i) => Plain::Int(*i),
            Value::Float(f) => Plain::Float(*f),
            Value::Str(s) => Plain::Str(s.clone()),
            Value::List(items) => Plain::List(plain_seq(items, path, on_cycle)?),
            Value::Tuple(items) => Plain::Tuple(plain_seq(items, path, on_cycle)?),
            Value::Node(node) => return node.plain_with(path, on_cycle),
        })
    }

    pub(crate) fn deep_copy_with(&self, memo: &mut Memo) -> Value {
        match self {
            Value::List(items) => {
                Value::List(items.iter().map(|v| v.deep_copy_with(memo)).collect())
            }
            Value::Tuple(items) => {
                Value::Tuple(items.iter().map(|v| v.deep_copy_with(memo)).collect())
            }
            Value::Node(node) => Value::Node(node.deep_copy_with(memo)),
            scalar => scalar.clone(),
        }
    }
}

fn plain_seq(
    items: &[Value],
    path: &mut Vec<*const ()>,
    on_cycle: OnCycle,
) -> Result<Vec<Plain>, NodeError> {
    items.iter().map(|v| v.plain_with(path, on_cycle)).collect()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            _ => false,
        }
    }
}

/// Hooks a plain structure: every mapping becomes a fresh [`Node`].
impl From<Plain> for Value {
    fn from(plain: Plain) -> Self {
        match plain {
            Plain::Null => Value::Null,
            Plain::Bool(b) => Value::Bool(b),
            Plain::Int(i) => Value::Int(i),
            Plain::Float(f) => Value::Float(f),
            Plain::Str(s) => Value::Str(s),
            Plain::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Plain::Tuple(items) => Value::Tuple(items.into_iter().map(Value::from).collect()),
            Plain::Map(map) => Value::Node(Node::from_map(map)),
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        Value::Node(node.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
