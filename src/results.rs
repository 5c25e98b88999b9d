use serde::Serialize;

use crate::types::{ColumnType, Value};

/// Normalized result of a statement.
///
/// `column_names`, `column_types` and every row have the same length. Column
/// names are taken verbatim from the engine and may repeat (e.g. two `id`
/// columns from a join); rows are positional so no value is lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub column_names: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<Value>>,
    pub last_insert_id: Option<String>,
}

impl ResultSet {
    /// An empty result with known column metadata.
    #[must_use]
    pub fn with_columns(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
        Self {
            column_names,
            column_types,
            rows: Vec::new(),
            last_insert_id: None,
        }
    }

    /// Result of a statement that produces no columns.
    #[must_use]
    pub fn without_columns(last_insert_id: Option<String>) -> Self {
        Self {
            last_insert_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with the given name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Value of the first column named `column_name` in row `row`.
    #[must_use]
    pub fn get(&self, row: usize, column_name: &str) -> Option<&Value> {
        let idx = self.column_index(column_name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}
