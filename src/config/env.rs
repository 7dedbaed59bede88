use crate::node::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Environment variables `PREFIX<sep>A<sep>B=v` become the entry `a.b = v`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn entries_from<I>(&self, vars: I) -> Vec<ConfigEntry>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut entries = Vec::new();

        for (key, value) in vars {
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path_str.is_empty() {
                continue;
            }

            let path: Vec<String> = path_str
                .split(&self.separator)
                .map(|s| s.to_lowercase())
                .collect();

            entries.push(ConfigEntry::at_path(path, coerce_value(&value)));
        }

        // Stable order so that overlapping variables merge deterministically.
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}

impl ConfigSource for EnvSource {
    fn entries(&mut self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(self.entries_from(std::env::vars()))
    }
}

fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::Str(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
