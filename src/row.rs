use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::RowValue;

/// Column names for one result stream, shared by every row it produces.
pub type ColumnNames = Arc<Vec<String>>;

/// A row from a streamed query result
///
/// Holds one value per column, in query-column order. Rows from the same stream
/// share a single [`ColumnNames`] allocation.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: ColumnNames,
    values: Vec<RowValue>,
}

impl Row {
    /// Create a new row from shared column names and this row's values.
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names of the result set
    /// * `values` - The values for this row, one per column
    #[must_use]
    pub fn new(column_names: ColumnNames, values: Vec<RowValue>) -> Self {
        debug_assert_eq!(column_names.len(), values.len());
        Self {
            column_names,
            values,
        }
    }

    /// Column names of the result set this row came from
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    ///
    /// # Returns
    ///
    /// The value at the column, or None if the column wasn't found
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[RowValue] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<RowValue> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name/value pairs for this row, useful when building lookups.
    #[must_use]
    pub fn to_map(&self) -> HashMap<&str, &RowValue> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
            .collect()
    }
}

/// Renders as `[v1 v2 ...]`.
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}
