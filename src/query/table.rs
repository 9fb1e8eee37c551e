//! Result envelope types.
//!
//! Tables serialize to the shape query hosts render directly:
//!
//! ```json
//! {
//!   "columns": [{"name": "value", "friendly_name": "Value", "type": "string"}],
//!   "rows": [{"value": "hello"}]
//! }
//! ```

use crate::query::decode::Decoded;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column types understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
}

/// Describes one column of a [`ResultTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub friendly_name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(
        name: impl Into<String>,
        friendly_name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            name: name.into(),
            friendly_name: friendly_name.into(),
            column_type,
        }
    }

    /// A string column whose display name is `name` capitalized.
    pub fn string(name: &str) -> Self {
        Self::new(name, capitalize(name), ColumnType::String)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    /// Bytes that were not valid UTF-8
    Raw(Vec<u8>),
}

impl From<Decoded> for Value {
    fn from(decoded: Decoded) -> Self {
        match decoded {
            Decoded::Text(text) => Value::Text(text),
            Decoded::Raw(bytes) => Value::Raw(bytes),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

/// A row maps column names to cells.
pub type Row = BTreeMap<String, Value>;

/// Columns plus rows. Every row holds a cell for every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
}

impl ResultTable {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row from cells given in column order.
    ///
    /// Missing trailing cells become `Null`; surplus cells are dropped.
    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut cells = cells.into_iter();
        let row: Row = self
            .columns
            .iter()
            .map(|column| {
                let cell = cells.next().map(Into::into).unwrap_or(Value::Null);
                (column.name.clone(), cell)
            })
            .collect();
        self.rows.push(row);
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// The cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        self.rows.iter().filter_map(|row| row.get(name)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResultTable {
        let mut table = ResultTable::new(vec![
            ColumnDescriptor::string("key"),
            ColumnDescriptor::string("value"),
        ]);
        table.push_row([Value::from("name"), Value::from("bob")]);
        table.push_row([Value::from("blob"), Value::Raw(vec![0xff, 0x00])]);
        table
    }

    #[test]
    fn test_column_descriptor_json() {
        let column = ColumnDescriptor::string("member");
        assert_eq!(
            serde_json::to_value(&column).unwrap(),
            json!({"name": "member", "friendly_name": "Member", "type": "string"})
        );
        assert_eq!(
            serde_json::to_value(ColumnType::Datetime).unwrap(),
            json!("datetime")
        );
    }

    #[test]
    fn test_push_row_fills_every_column() {
        let mut table = ResultTable::new(vec![
            ColumnDescriptor::string("a"),
            ColumnDescriptor::new("b", "B", ColumnType::Integer),
        ]);
        table.push_row([Value::from("only a")]);
        table.push_row([Value::from("x"), Value::from(7i64), Value::from("extra")]);

        for row in &table.rows {
            assert_eq!(row.len(), 2);
        }
        assert_eq!(table.rows[0]["b"], Value::Null);
        assert_eq!(table.rows[1]["b"], Value::Integer(7));
    }

    #[test]
    fn test_table_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["rows"][0], json!({"key": "name", "value": "bob"}));
        assert_eq!(value["rows"][1]["value"], json!([255, 0]));
        assert_eq!(value["columns"][1]["friendly_name"], json!("Value"));
    }

    #[test]
    fn test_table_json_round_trip() {
        let table = sample();
        let json = serde_json::to_string(&table).unwrap();
        let back: ResultTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_cells_round_trip_by_kind() {
        let mut table = ResultTable::new(vec![ColumnDescriptor::new(
            "n",
            "N",
            ColumnType::Integer,
        )]);
        table.push_row([Value::Integer(-3)]);
        table.push_row([Value::Null]);

        let back: ResultTable =
            serde_json::from_str(&serde_json::to_string(&table).unwrap()).unwrap();
        assert_eq!(back.column("n"), vec![&Value::Integer(-3), &Value::Null]);
    }

    #[test]
    fn test_column_helpers() {
        let table = sample();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["key", "value"]);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert_eq!(capitalize(""), "");
    }
}
