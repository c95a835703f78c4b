//! Tabular data rows loaded into a class.

use indexmap::IndexSet;

use kinro_core::{
    identifier::Id,
    schema::{DataRow, RowContent},
};

/// Rows of one class together with the columns they use.
///
/// Columns are the union of every row's content keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<DataRow>,
}

impl DataTable {
    pub fn from_rows(rows: Vec<DataRow>) -> Self {
        let columns: IndexSet<&str> = rows
            .iter()
            .flat_map(|row| row.content.keys().map(String::as_str))
            .collect();
        let columns = columns.into_iter().map(str::to_string).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the ids of every row, in order.
    pub fn row_ids(&self) -> Vec<Id> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }

    /// Returns the cell at `column` of `row` rendered as text, or an empty
    /// string when the row has no such cell.
    pub fn cell_text(&self, row: usize, column: &str) -> String {
        self.rows
            .get(row)
            .and_then(|row| row.content.get(column))
            .map(cell_to_text)
            .unwrap_or_default()
    }
}

/// Keeps only the cells whose key is one of `attribute_names`.
pub fn filter_to_attributes<S: AsRef<str>>(
    content: &RowContent,
    attribute_names: &[S],
) -> RowContent {
    content
        .iter()
        .filter(|(key, _)| attribute_names.iter().any(|name| name.as_ref() == key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Whether no cell of `content` holds a value.
///
/// `null` and strings that are empty after trimming count as empty.
pub fn is_blank(content: &RowContent) -> bool {
    content.values().all(|value| match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(text) => text.trim().is_empty(),
        _ => false,
    })
}

fn cell_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(id: &str, content: serde_json::Value) -> DataRow {
        DataRow {
            id: Id::new(id),
            class_id: Id::new("c"),
            content: serde_json::from_value(content).unwrap(),
        }
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let table = DataTable::from_rows(vec![
            row("1", json!({"nombre": "Ana", "edad": 31})),
            row("2", json!({"email": "b@x.io", "nombre": "Bo"})),
        ]);

        assert_eq!(table.columns(), ["nombre", "edad", "email"]);
        assert_eq!(table.cell_text(0, "edad"), "31");
        assert_eq!(table.cell_text(1, "edad"), "");
        assert_eq!(table.row_ids(), [Id::new("1"), Id::new("2")]);
    }

    #[test]
    fn test_filter_to_attributes_keeps_order() {
        let content: RowContent =
            serde_json::from_value(json!({"b": 1, "extra": 2, "a": 3})).unwrap();

        let filtered = filter_to_attributes(&content, &["a", "b"]);

        let keys: Vec<_> = filtered.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_blank_rows() {
        let blank: RowContent = serde_json::from_value(json!({"a": "  ", "b": null})).unwrap();
        let zero: RowContent = serde_json::from_value(json!({"a": 0})).unwrap();

        assert!(is_blank(&blank));
        assert!(is_blank(&RowContent::new()));
        assert!(!is_blank(&zero));
    }
}
