//! Table output formatting for CLI commands
//!
//! Renders query results and key/value summaries with comfy-table.
//! Numeric cells are right-aligned; NULL cells are dimmed when colors are on.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde_json::Value;
use std::env;

use crate::domain::models::QueryResult;

const MAX_CELL_WIDTH: usize = 60;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format a query result as a table
    pub fn format_result(&self, result: &QueryResult) -> String {
        let mut table = self.create_base_table();

        table.set_header(
            result
                .columns
                .iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
        );

        for row in &result.rows {
            table.add_row(row.iter().map(|value| self.value_cell(value)));
        }

        table.to_string()
    }

    /// Format label/value pairs as a two-column table
    pub fn format_pairs<'a, I>(&self, pairs: I) -> String
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut table = self.create_base_table();
        for (label, value) in pairs {
            table.add_row(vec![
                Cell::new(label).add_attribute(Attribute::Bold),
                Cell::new(value),
            ]);
        }
        table.to_string()
    }

    fn value_cell(&self, value: &Value) -> Cell {
        match value {
            Value::Null if self.use_colors => Cell::new("NULL").fg(Color::DarkGrey),
            Value::Null => Cell::new("NULL"),
            Value::Number(n) => Cell::new(format_number(n)).set_alignment(CellAlignment::Right),
            Value::Bool(b) => Cell::new(b),
            Value::String(s) => Cell::new(truncate_text(s, MAX_CELL_WIDTH)),
            other => Cell::new(truncate_text(&other.to_string(), MAX_CELL_WIDTH)),
        }
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        if !self.use_colors {
            table.force_no_tty();
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
pub fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    console::colors_enabled()
}

/// Integers as-is, floats with two decimals
fn format_number(n: &serde_json::Number) -> String {
    if n.is_f64() {
        n.as_f64().map_or_else(|| n.to_string(), |f| format!("{f:.2}"))
    } else {
        n.to_string()
    }
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() -> TableFormatter {
        TableFormatter::with_config(false, Some(120))
    }

    #[test]
    fn test_format_result_includes_headers_and_cells() {
        let result = QueryResult {
            columns: vec!["asset".to_string(), "total_usd".to_string()],
            rows: vec![
                vec![json!("wNEAR"), json!(1234.5)],
                vec![json!("USDC"), Value::Null],
            ],
        };
        let rendered = plain().format_result(&result);

        assert!(rendered.contains("asset"));
        assert!(rendered.contains("total_usd"));
        assert!(rendered.contains("1234.50"));
        assert!(rendered.contains("NULL"));
    }

    #[test]
    fn test_format_pairs() {
        let rendered = plain().format_pairs([("account", "acct".to_string())]);
        assert!(rendered.contains("account"));
        assert!(rendered.contains("acct"));
    }

    #[test]
    fn test_truncate_text_is_char_safe() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(&serde_json::Number::from(42)), "42");
        assert_eq!(
            format_number(&serde_json::Number::from_f64(2.5).unwrap()),
            "2.50"
        );
    }
}
