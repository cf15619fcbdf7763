//! Column reading for a single entity.

use crate::provider::Entity;
use crate::schema::{Column, SchemaMap};
use tracing::warn;

/// Reads an entity's columns from parsed schema data, or from the entity itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnReader<'a> {
    schema: Option<&'a SchemaMap>,
}

impl<'a> ColumnReader<'a> {
    pub fn new(schema: Option<&'a SchemaMap>) -> Self {
        Self { schema }
    }

    /// Ordered columns for the entity.
    ///
    /// A table present in the schema data is returned verbatim without asking
    /// the entity. Introspection failures give an empty list.
    pub fn read(&self, entity: &dyn Entity) -> Vec<Column> {
        if let Some(columns) = self.schema.and_then(|s| s.get(entity.table_name())) {
            return columns.clone();
        }

        let primary_key = entity.primary_key();
        match entity.columns() {
            Ok(columns) => columns
                .into_iter()
                .map(|col| Column {
                    primary: primary_key == Some(col.name.as_str()),
                    name: col.name,
                    col_type: col.sql_type,
                    nullable: col.null,
                    default: col.default,
                })
                .collect(),
            Err(e) => {
                warn!(
                    "Could not read columns for {}: {}",
                    entity.name().unwrap_or(entity.table_name()),
                    e
                );
                Vec::new()
            }
        }
    }
}
