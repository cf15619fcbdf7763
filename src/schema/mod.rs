//! Schema extraction from on-disk schema descriptions.
//!
//! This module provides:
//! - The normalized column model shared by every schema source
//! - Parsing of the declarative `create_table` schema format
//! - Parsing of `CREATE TABLE` statements from a SQL structure dump
//! - Source resolution with auto-detection and fallback between the two

mod ddl;
mod declarative;
mod source;

pub use ddl::*;
pub use declarative::*;
pub use source::*;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Parsed schema: table name to ordered column list, in declaration order.
pub type SchemaMap = IndexMap<String, Vec<Column>>;

/// A normalized column, identical regardless of which format it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Logical type tag (`string`, `integer`, `datetime`, ...)
    #[serde(rename = "type")]
    pub col_type: String,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Literal default value, if one was declared
    pub default: Option<String>,
    /// Whether the column is (part of) the primary key
    pub primary: bool,
}

impl Column {
    /// A nullable, non-primary column without a default.
    pub fn new(name: impl Into<String>, col_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            col_type: col_type.into(),
            nullable: true,
            default: None,
            primary: false,
        }
    }

    /// The synthetic `id` column that the declarative format implies.
    pub fn primary_key(col_type: impl Into<String>) -> Self {
        Self {
            name: "id".to_string(),
            col_type: col_type.into(),
            nullable: false,
            default: None,
            primary: true,
        }
    }
}

/// Read a schema description from disk.
///
/// A missing file is not an error: it yields `None` so that callers can fall
/// back to another source. A file that exists but cannot be read is logged.
pub(crate) fn read_schema_file(path: &Path) -> Option<String> {
    if !path.exists() {
        debug!("schema file not found: {}", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!("Could not read schema file {}: {}", path.display(), e);
            None
        }
    }
}

/// Which schema description to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFormat {
    /// Try the declarative file first, fall back to the SQL dump
    #[default]
    Auto,
    /// Declarative `create_table` schema file only
    Ruby,
    /// SQL structure dump only
    Sql,
}

impl FromStr for SchemaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SchemaFormat::Auto),
            "ruby" | "rb" => Ok(SchemaFormat::Ruby),
            "sql" => Ok(SchemaFormat::Sql),
            _ => Err(format!(
                "Unknown schema format: {}. Valid options: auto, ruby, sql",
                s
            )),
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaFormat::Auto => write!(f, "auto"),
            SchemaFormat::Ruby => write!(f, "ruby"),
            SchemaFormat::Sql => write!(f, "sql"),
        }
    }
}
