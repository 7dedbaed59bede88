//! Schemas for table-loading settings.
//!
//! ```yaml
//! input_table_list:
//!   - tablename: households
//!     filename: households.csv
//!     index_col: household_id
//!     rename_columns:
//!       HHID: household_id
//!       TAZ: home_zone_id
//!     keep_columns:
//!       - home_zone_id
//!       - income
//! ```

use std::sync::OnceLock;

use crate::node::{Node, Value};
use crate::schema::{Configuration, Field, Kind, Schema, SchemaType};

/// One input table: where to read it and how to shape its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTable(Configuration);

impl SchemaType for InputTable {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("InputTable")
                .field(Field::new("tablename", Kind::Str))
                .field(Field::new("filename", Kind::Str))
                .field(Field::new("index_col", Kind::Str))
                .field(Field::new("rename_columns", Kind::Mapping))
                .field(Field::new("keep_columns", Kind::Sequence))
                .build()
        })
    }

    fn from_configuration(config: Configuration) -> Self {
        Self(config)
    }
}

impl InputTable {
    pub fn tablename(&self) -> Option<&str> {
        self.text("tablename")
    }

    pub fn filename(&self) -> Option<&str> {
        self.text("filename")
    }

    pub fn index_col(&self) -> Option<&str> {
        self.text("index_col")
    }

    pub fn rename_columns(&self) -> Option<&Node> {
        self.0.get("rename_columns").ok().and_then(|s| s.as_node())
    }

    pub fn keep_columns(&self) -> Option<&[Value]> {
        self.0.get("keep_columns").ok().and_then(|s| s.as_seq())
    }

    pub fn configuration(&self) -> &Configuration {
        &self.0
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).ok().and_then(|s| s.as_str())
    }
}

/// Top-level settings listing the input tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings(Configuration);

impl SchemaType for Settings {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Settings")
                .field(
                    Field::new(
                        "input_table_list",
                        Kind::list_of(Kind::Config(<InputTable as SchemaType>::schema)),
                    )
                    .with_coerce(true),
                )
                .build()
        })
    }

    fn from_configuration(config: Configuration) -> Self {
        Self(config)
    }
}

impl Settings {
    pub fn input_tables(&self) -> Vec<InputTable> {
        self.0
            .get("input_table_list")
            .ok()
            .and_then(|s| s.as_configs())
            .map(|configs| configs.iter().cloned().map(InputTable).collect())
            .unwrap_or_default()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;

    const HOUSEHOLDS: &str = "\
tablename: households
filename: households.csv
index_col: household_id
rename_columns:
  HHID: household_id
keep_columns:
  - home_zone_id
  - income
";

    #[test]
    fn test_input_table_from_text() {
        let table = InputTable::load(HOUSEHOLDS).unwrap();
        assert!(table.configuration().is_frozen());
        assert_eq!(table.tablename(), Some("households"));
        assert_eq!(table.filename(), Some("households.csv"));
        assert_eq!(table.index_col(), Some("household_id"));
        assert_eq!(
            table.keep_columns().unwrap(),
            &[Value::from("home_zone_id"), Value::from("income")]
        );
        assert_eq!(
            table.rename_columns().unwrap().get("HHID").unwrap(),
            Value::from("household_id")
        );
    }

    #[test]
    fn test_input_table_rejects_unknown_keyword() {
        let text = format!("{HOUSEHOLDS}colour: blue\n");
        let err = InputTable::load(text).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { schema: "InputTable", .. }));
    }

    #[test]
    fn test_input_table_requires_tablename() {
        let text = HOUSEHOLDS.replace("tablename: households\n", "");
        let err = InputTable::load(text).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { field: "tablename", .. }));
    }

    #[test]
    fn test_settings_coerce_each_table() {
        let indented: String = HOUSEHOLDS
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let prefix = if i == 0 { "  - " } else { "    " };
                format!("{prefix}{line}\n")
            })
            .collect();
        let settings = Settings::load(format!("input_table_list:\n{indented}")).unwrap();

        let tables = settings.input_tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].tablename(), Some("households"));
    }

    #[test]
    fn test_settings_reports_bad_table() {
        let err = Settings::load("input_table_list:\n  - filename: x.csv\n").unwrap_err();
        assert!(matches!(err, SchemaError::Subconfig { field: "input_table_list", .. }));
    }
}
