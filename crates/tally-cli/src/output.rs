// crates/tally-cli/src/output.rs
//
// Output formatting utilities for the Tally CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// One field of an API object.
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Flatten a serializable object into field/value rows, nested objects
/// joined with dots (`median_chain_props.maximum_block_size`).
pub fn field_rows<T: Serialize>(data: &T) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    match serde_json::to_value(data) {
        Ok(value) => flatten("", &value, &mut rows),
        Err(e) => rows.push(FieldRow {
            field: "error".to_string(),
            value: e.to_string(),
        }),
    }
    rows
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<FieldRow>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let field = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&field, inner, rows);
            }
        }
        Value::String(s) => rows.push(FieldRow {
            field: prefix.to_string(),
            value: s.clone(),
        }),
        other => rows.push(FieldRow {
            field: prefix.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Render one API object in the requested format.
pub fn render<T: Serialize>(format: OutputFormat, data: &T) -> String {
    match format {
        OutputFormat::Table => format_table(&field_rows(data)),
        OutputFormat::Json => format_json(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Inner {
        size: u32,
    }

    #[derive(Serialize)]
    struct Outer {
        name: String,
        inner: Inner,
    }

    #[test]
    fn test_nested_fields_flattened() {
        let rows = field_rows(&Outer {
            name: "tally".to_string(),
            inner: Inner { size: 7 },
        });
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.field.as_str(), r.value.as_str()))
            .collect();
        assert!(pairs.contains(&("name", "tally")));
        assert!(pairs.contains(&("inner.size", "7")));
    }

    #[test]
    fn test_json_mode_is_plain_json() {
        let out = render(OutputFormat::Json, &Inner { size: 3 });
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["size"], 3);
    }
}
