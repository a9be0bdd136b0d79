use crate::errors::TableError;

use super::value::ProviderValue;

/// A rows-by-named-columns table as returned by a provider.
///
/// Column labels and index labels are arbitrary values (statement tables use
/// period end dates as columns, price history uses timestamps as the index).
/// The shape is not validated on construction; [`Table::split`] does that.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<ProviderValue>,
    index: Vec<ProviderValue>,
    rows: Vec<Vec<ProviderValue>>,
}

/// Borrowed column/index/data decomposition of a well-formed table.
#[derive(Debug)]
pub struct SplitTable<'a> {
    pub columns: &'a [ProviderValue],
    pub index: &'a [ProviderValue],
    pub data: &'a [Vec<ProviderValue>],
}

impl Table {
    pub fn new(
        columns: Vec<ProviderValue>,
        index: Vec<ProviderValue>,
        rows: Vec<Vec<ProviderValue>>,
    ) -> Self {
        Self {
            columns,
            index,
            rows,
        }
    }

    /// An empty table with the given string column labels.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|c| ProviderValue::Str(c.into()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn push_row(&mut self, label: ProviderValue, cells: Vec<ProviderValue>) {
        self.index.push(label);
        self.rows.push(cells);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// A table is empty when either axis has length zero.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ProviderValue] {
        &self.columns
    }

    /// Position of a column with a string label.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| matches!(c, ProviderValue::Str(s) if s == name))
    }

    /// Decompose into parallel columns/index/data, checking the shape.
    pub fn split(&self) -> Result<SplitTable<'_>, TableError> {
        if self.index.len() != self.rows.len() {
            return Err(TableError::IndexMismatch {
                index: self.index.len(),
                rows: self.rows.len(),
            });
        }
        for (row, cells) in self.rows.iter().enumerate() {
            if cells.len() != self.columns.len() {
                return Err(TableError::RaggedRow {
                    row,
                    width: cells.len(),
                    columns: self.columns.len(),
                });
            }
        }
        Ok(SplitTable {
            columns: &self.columns,
            index: &self.index,
            data: &self.rows,
        })
    }

    /// Iterate rows in table order, stopping at the shorter of index and rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.index
            .iter()
            .zip(self.rows.iter())
            .map(move |(label, cells)| Row {
                table: self,
                label,
                cells,
            })
    }
}

/// One row of a [`Table`], addressable by column label.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: &'a Table,
    label: &'a ProviderValue,
    cells: &'a [ProviderValue],
}

impl<'a> Row<'a> {
    pub fn label(&self) -> &'a ProviderValue {
        self.label
    }

    /// Cell under a string column label, if both exist.
    pub fn get(&self, column: &str) -> Option<&'a ProviderValue> {
        self.table
            .column_position(column)
            .and_then(|pos| self.cells.get(pos))
    }
}

/// An ordered mapping from a (usually date) key to a scalar value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    points: Vec<(ProviderValue, ProviderValue)>,
}

impl Series {
    pub fn new(points: Vec<(ProviderValue, ProviderValue)>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, key: ProviderValue, value: ProviderValue) {
        self.points.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProviderValue, &ProviderValue)> {
        self.points.iter().map(|(k, v)| (k, v))
    }
}
