//! Query result types shared by executors, the codec and callers

use serde::{Deserialize, Serialize};

/// One row as produced by the executor
pub type Row = serde_json::Value;

/// Rows of a result, tagged with their shape by the executor.
///
/// A statement that yields several result sets (stored procedures, batched
/// statements) reports [`Rows::Multi`]. A single result set whose rows happen
/// to be arrays is still [`Rows::Single`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "sets", rename_all = "lowercase")]
pub enum Rows {
    Single(Vec<Row>),
    Multi(Vec<Vec<Row>>),
}

impl Rows {
    /// Total number of rows across all result sets
    pub fn len(&self) -> usize {
        match self {
            Rows::Single(rows) => rows.len(),
            Rows::Multi(sets) => sets.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of result sets
    pub fn set_count(&self) -> usize {
        match self {
            Rows::Single(_) => 1,
            Rows::Multi(sets) => sets.len(),
        }
    }
}

impl Default for Rows {
    fn default() -> Self {
        Rows::Single(Vec::new())
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name or alias
    pub name: String,

    /// Database type name, if the executor reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,

    /// Originating table, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: None,
            table: None,
        }
    }

    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Where a result came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultSource {
    /// Produced by the query executor on this call
    #[default]
    Executor,

    /// Decoded from the cache entry stored under `key`
    Cache { key: String },
}

/// Rows plus field metadata, annotated with their source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub rows: Rows,
    pub fields: Vec<Field>,
    pub source: ResultSource,
}

impl QueryResult {
    /// Result with a single result set
    pub fn single(rows: Vec<Row>, fields: Vec<Field>) -> Self {
        Self {
            rows: Rows::Single(rows),
            fields,
            source: ResultSource::Executor,
        }
    }

    /// Result with several result sets
    pub fn multi(sets: Vec<Vec<Row>>, fields: Vec<Field>) -> Self {
        Self {
            rows: Rows::Multi(sets),
            fields,
            source: ResultSource::Executor,
        }
    }

    /// Replace the source annotation
    pub fn with_source(mut self, source: ResultSource) -> Self {
        self.source = source;
        self
    }

    /// The key this result was served from, if it was a cache hit
    pub fn cache_hit(&self) -> Option<&str> {
        match &self.source {
            ResultSource::Cache { key } => Some(key),
            ResultSource::Executor => None,
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        self.cache_hit().is_some()
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.rows, Rows::Multi(_))
    }

    /// Total number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_counts() {
        let single = QueryResult::single(vec![json!({"a": 1}), json!({"a": 2})], vec![]);
        assert_eq!(single.row_count(), 2);
        assert_eq!(single.rows.set_count(), 1);
        assert!(!single.is_multi());

        let multi = QueryResult::multi(vec![vec![json!(1)], vec![json!(2), json!(3)], vec![]], vec![]);
        assert_eq!(multi.row_count(), 3);
        assert_eq!(multi.rows.set_count(), 3);
        assert!(multi.is_multi());
    }

    #[test]
    fn test_cache_hit_annotation() {
        let result = QueryResult::single(vec![], vec![]);
        assert_eq!(result.cache_hit(), None);

        let hit = result.with_source(ResultSource::Cache {
            key: "sql.abc".to_string(),
        });
        assert_eq!(hit.cache_hit(), Some("sql.abc"));
        assert!(hit.is_cache_hit());
    }

    #[test]
    fn test_rows_tagged_serialization() {
        let rows = Rows::Single(vec![json!([1, 2])]);
        let value = serde_json::to_value(&rows).unwrap();
        assert_eq!(value, json!({"shape": "single", "sets": [[1, 2]]}));

        let rows = Rows::Multi(vec![vec![json!({"x": 1})]]);
        let value = serde_json::to_value(&rows).unwrap();
        assert_eq!(value, json!({"shape": "multi", "sets": [[{"x": 1}]]}));
    }

    #[test]
    fn test_field_builder() {
        let field = Field::new("id").with_type("BIGINT").with_table("users");
        assert_eq!(field.name, "id");
        assert_eq!(field.column_type.as_deref(), Some("BIGINT"));
        assert_eq!(field.table.as_deref(), Some("users"));
    }
}
