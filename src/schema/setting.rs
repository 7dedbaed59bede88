use crate::node::{Node, Plain, Value};

use super::Configuration;

/// The value held by one field of a [`Configuration`].
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Value(Value),
    Config(Configuration),
    /// A sequence whose elements are configurations of one schema.
    Configs(Vec<Configuration>),
}

impl Setting {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Setting::Value(value) => value.kind_name(),
            Setting::Config(config) => config.schema().name(),
            Setting::Configs(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Setting::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Setting::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_int)
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_float)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_node(&self) -> Option<&Node> {
        self.as_value().and_then(Value::as_node)
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        self.as_value().and_then(Value::as_seq)
    }

    pub fn as_config(&self) -> Option<&Configuration> {
        match self {
            Setting::Config(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_configs(&self) -> Option<&[Configuration]> {
        match self {
            Setting::Configs(configs) => Some(configs),
            _ => None,
        }
    }

    pub(crate) fn to_plain(&self) -> Result<Plain, super::SchemaError> {
        match self {
            Setting::Value(value) => Ok(value.to_plain()?),
            Setting::Config(config) => config.to_plain(),
            Setting::Configs(configs) => configs
                .iter()
                .map(Configuration::to_plain)
                .collect::<Result<_, _>>()
                .map(Plain::List),
        }
    }
}

impl From<Value> for Setting {
    fn from(value: Value) -> Self {
        Setting::Value(value)
    }
}

impl From<Node> for Setting {
    fn from(node: Node) -> Self {
        Setting::Value(Value::Node(node))
    }
}

impl From<&str> for Setting {
    fn from(s: &str) -> Self {
        Setting::Value(s.into())
    }
}

impl From<String> for Setting {
    fn from(s: String) -> Self {
        Setting::Value(s.into())
    }
}

impl From<i64> for Setting {
    fn from(i: i64) -> Self {
        Setting::Value(i.into())
    }
}

impl From<i32> for Setting {
    fn from(i: i32) -> Self {
        Setting::Value(i.into())
    }
}

impl From<f64> for Setting {
    fn from(f: f64) -> Self {
        Setting::Value(f.into())
    }
}

impl From<bool> for Setting {
    fn from(b: bool) -> Self {
        Setting::Value(b.into())
    }
}

impl From<Vec<Value>> for Setting {
    fn from(items: Vec<Value>) -> Self {
        Setting::Value(Value::List(items))
    }
}

impl From<Configuration> for Setting {
    fn from(config: Configuration) -> Self {
        Setting::Config(config)
    }
}

impl From<Vec<Configuration>> for Setting {
    fn from(configs: Vec<Configuration>) -> Self {
        Setting::Configs(configs)
    }
}
