//! Rendering of command results as a table, JSON, or CSV.

use std::borrow::Cow;

use chaindb_common::types::Value;
use comfy_table::{modifiers, presets, Cell, ContentArrangement, Table};
use serde_json::{Map, Value as JsonValue};

/// Text shown for an absent value in table and CSV output.
const ABSENT: &str = "NULL";

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
    /// CSV output.
    Csv,
}

impl OutputFormat {
    /// Parses a format name as written in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Column headers and rows produced by a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column headers.
    pub columns: Vec<String>,
    /// Rows of values; `None` is an absent value.
    pub rows: Vec<Vec<Option<Value>>>,
}

impl ResultSet {
    /// Renders the result set in `format`.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => self.to_json(),
            OutputFormat::Csv => self.to_csv(),
        }
    }

    fn to_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(self.columns.iter().map(Cell::new));

        for row in &self.rows {
            table.add_row(row.iter().map(|value| Cell::new(text(value.as_ref()))));
        }
        table.to_string()
    }

    /// One JSON object per row, keyed by column header.
    fn to_json(&self) -> String {
        let rows: Vec<JsonValue> = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, JsonValue> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|value| json(value.as_ref())))
                    .collect();
                JsonValue::Object(object)
            })
            .collect();

        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn to_csv(&self) -> String {
        let mut out = String::new();
        if !self.columns.is_empty() {
            push_csv_line(&mut out, self.columns.iter().map(|c| csv_field(c)));
        }
        for row in &self.rows {
            push_csv_line(
                &mut out,
                row.iter()
                    .map(|value| csv_field(&text(value.as_ref())).into_owned()),
            );
        }
        out
    }
}

fn push_csv_line<F: AsRef<str>>(out: &mut String, fields: impl Iterator<Item = F>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(field.as_ref());
    }
    out.push('\n');
}

fn text(value: Option<&Value>) -> String {
    value.map_or_else(|| ABSENT.to_string(), ToString::to_string)
}

fn json(value: Option<&Value>) -> JsonValue {
    match value {
        None => JsonValue::Null,
        Some(Value::Int(v)) => JsonValue::from(*v),
        Some(Value::Uint(v)) => JsonValue::from(*v),
        // Non-finite numbers have no JSON form and become null.
        Some(Value::Num(v)) => JsonValue::from(*v),
        Some(Value::Str(s)) => JsonValue::from(s.as_str()),
    }
}

/// Quotes a CSV field that contains a separator, quote, or line break.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["id".to_string(), "name".to_string(), "score".to_string()],
            rows: vec![
                vec![
                    Some(Value::Uint(1)),
                    Some(Value::str("Alice")),
                    Some(Value::Num(9.5)),
                ],
                vec![Some(Value::Uint(2)), Some(Value::str("Bob, Jr.")), None],
            ],
        }
    }

    #[test]
    fn test_table() {
        let output = sample().render(OutputFormat::Table);
        assert!(output.contains("id"));
        assert!(output.contains("Alice"));
        assert!(output.contains("NULL"));
    }

    #[test]
    fn test_json() {
        let output = sample().render(OutputFormat::Json);

        let parsed: Vec<JsonValue> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["id"], 1);
        assert_eq!(parsed[0]["name"], "Alice");
        assert_eq!(parsed[0]["score"], 9.5);
        assert!(parsed[1]["score"].is_null());
    }

    #[test]
    fn test_json_empty() {
        assert_eq!(ResultSet::default().render(OutputFormat::Json), "[]");
    }

    #[test]
    fn test_csv() {
        let output = sample().render(OutputFormat::Csv);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, ["id,name,score", "1,Alice,9.5", "2,\"Bob, Jr.\",NULL"]);
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(OutputFormat::from_name("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_name("xml"), None);
    }
}
