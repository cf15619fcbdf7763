//! Schema source resolution with auto-detection.
//!
//! `auto` always tries the declarative schema file first and only parses the
//! SQL structure dump when the declarative parse comes back empty.

use super::{ColumnarSchemaParser, SchemaFormat, SchemaMap, SqlDdlParser};
use std::path::PathBuf;
use tracing::info;

/// Schema tables together with the format they were read from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSchema {
    /// Parsed tables, empty when no source produced anything
    pub tables: SchemaMap,
    /// Format that produced `tables`, `None` when nothing was found
    pub origin: Option<SchemaFormat>,
}

impl ResolvedSchema {
    /// Whether any table was found
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The tables, or `None` when empty so that callers fall back to live introspection
    pub fn authoritative(&self) -> Option<&SchemaMap> {
        if self.tables.is_empty() {
            None
        } else {
            Some(&self.tables)
        }
    }
}

/// Picks and runs the schema parser(s) for a configured format
#[derive(Debug, Clone)]
pub struct SchemaSource {
    format: SchemaFormat,
    schema_path: PathBuf,
    structure_path: PathBuf,
}

impl SchemaSource {
    /// Create a source for the given format and file locations
    pub fn new(
        format: SchemaFormat,
        schema_path: impl Into<PathBuf>,
        structure_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            format,
            schema_path: schema_path.into(),
            structure_path: structure_path.into(),
        }
    }

    /// The configured format
    pub fn format(&self) -> SchemaFormat {
        self.format
    }

    /// Parse the configured source(s)
    pub fn resolve(&self) -> ResolvedSchema {
        let declarative = ColumnarSchemaParser::new(self.schema_path.clone());
        let sql = SqlDdlParser::new(self.structure_path.clone());
        let resolved = resolve_with(self.format, || declarative.parse(), || sql.parse());

        match resolved.origin {
            Some(origin) => info!(
                "Using {} schema: {} tables",
                origin,
                resolved.tables.len()
            ),
            None => info!("No schema file found, falling back to live introspection"),
        }

        resolved
    }
}

/// Resolution strategy, independent of where the text comes from
pub fn resolve_with<R, S>(format: SchemaFormat, declarative: R, sql: S) -> ResolvedSchema
where
    R: FnOnce() -> SchemaMap,
    S: FnOnce() -> SchemaMap,
{
    let (tables, origin) = match format {
        SchemaFormat::Ruby => (declarative(), SchemaFormat::Ruby),
        SchemaFormat::Sql => (sql(), SchemaFormat::Sql),
        SchemaFormat::Auto => {
            let tables = declarative();
            if tables.is_empty() {
                (sql(), SchemaFormat::Sql)
            } else {
                (tables, SchemaFormat::Ruby)
            }
        }
    };

    let origin = (!tables.is_empty()).then_some(origin);
    ResolvedSchema { tables, origin }
}
