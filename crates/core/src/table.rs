use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Row = BTreeMap<String, String>;

/// Ordered columns plus ordered rows of string cells.
///
/// Produced either from page markup (header and cell text) or from JSON
/// records returned by the API. A row may lack a cell for a declared column
/// when the source row was shorter than the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RawTable {
    /// Builds a table from a header and positional cell rows.
    ///
    /// Cells beyond the header width are dropped; missing trailing cells are left absent.
    #[must_use]
    pub fn from_cells(columns: Vec<String>, cell_rows: Vec<Vec<String>>) -> Self {
        let rows = cell_rows
            .into_iter()
            .map(|cells| {
                columns
                    .iter()
                    .cloned()
                    .zip(cells)
                    .collect::<Row>()
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from JSON records, one row per record.
    ///
    /// Columns are the union of record keys in first-seen order. Strings are
    /// kept verbatim, `null` becomes an empty string, and other values use
    /// their JSON text. Non-object records are skipped.
    #[must_use]
    pub fn from_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let Some(object) = record.as_object() else {
                continue;
            };
            let mut row = Row::new();
            for (key, value) in object {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
                row.insert(key.clone(), stringify(value));
            }
            rows.push(row);
        }

        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell at `row`/`column`, `None` if either is absent.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
