use crate::Value;
use std::sync::Arc;

/// Column names of a result set, shared by all its rows.
pub type RowNames = Arc<[String]>;
/// Values of a single row.
pub type Row = Box<[Value]>;

/// A row together with the names of its columns.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the column named `name`, case insensitive.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

/// All the rows of one result set.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub labels: RowNames,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn labeled(&self) -> impl Iterator<Item = RowLabeled> + '_ {
        self.rows
            .iter()
            .map(|row| RowLabeled::new(self.labels.clone(), row.clone()))
    }
}
