use std::collections::HashMap;

use super::sql_types::SqlType;
use super::table_ref::QuerySourceId;

/// Property metadata lookup: maps a logical property of a query source to
/// the physical column that stores it.
pub trait PropertyCatalog {
    fn column_for(&self, property: &str, query_source: QuerySourceId) -> Option<(String, SqlType)>;
}

/// Registry mapping (query source, property) pairs to columns.
///
/// Example:
/// - Registered: (#1, "fullName") → ("full_name", text)
/// - `bind_property("fullName", #1)` binds `c.full_name`
#[derive(Debug, PartialEq, Clone, Default)]
pub struct InMemoryCatalog {
    columns: HashMap<(QuerySourceId, String), (String, SqlType)>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a column mapping: (query source, property) → (column, type)
    pub fn register(
        &mut self,
        query_source: QuerySourceId,
        property: impl Into<String>,
        column: impl Into<String>,
        ty: SqlType,
    ) -> &mut Self {
        self.columns
            .insert((query_source, property.into()), (column.into(), ty));
        self
    }
}

impl PropertyCatalog for InMemoryCatalog {
    fn column_for(&self, property: &str, query_source: QuerySourceId) -> Option<(String, SqlType)> {
        self.columns
            .get(&(query_source, property.to_string()))
            .cloned()
    }
}
