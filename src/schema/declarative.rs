//! Parser for the declarative `create_table` schema format.
//!
//! The format is processed line by line:
//! - `create_table "name"[, id: :type | id: false] do |t|` opens a table
//! - `t.<type> "<column>"[, options]` declares a column
//! - `end` closes the table and prepends the implied `id` column
//!
//! Anything else (indexes, foreign keys, extensions, comments) is skipped.

use super::{read_schema_file, Column, SchemaMap};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Default path of the declarative schema file, relative to the project root
pub const DEFAULT_SCHEMA_PATH: &str = "db/schema.rb";

/// Type of the implied primary key when the table does not override it
const DEFAULT_PK_TYPE: &str = "integer";

/// Regex for a table-open statement
static CREATE_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\Acreate_table\s+"(\w+)""#).unwrap());

/// Regex for `id: false` on the table-open line
static NO_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"id:\s*false").unwrap());

/// Regex for `id: :uuid` style primary key type overrides
static ID_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"id:\s*:(\w+)").unwrap());

/// Regex for a column statement: type, name, trailing options
static COLUMN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\At\.(\w+)\s+"(\w+)"(.*)"#).unwrap());

/// Regex for `null: false`
static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"null:\s*false").unwrap());

/// Regex for quoted string or numeric defaults
static DEFAULT_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"default:\s*(?:"([^"]*)"|(\d+(?:\.\d+)?))"#).unwrap());

/// Regex for boolean defaults
static DEFAULT_BOOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default:\s*(true|false)\b").unwrap());

/// An open `create_table` block
#[derive(Debug)]
struct OpenTable {
    name: String,
    pk_type: Option<String>,
    columns: Vec<Column>,
}

impl OpenTable {
    fn close(mut self) -> (String, Vec<Column>) {
        if let Some(pk_type) = self.pk_type {
            self.columns.insert(0, Column::primary_key(pk_type));
        }
        (self.name, self.columns)
    }

    /// Columns collected so far, without the implied `id`
    fn abandon(self) -> (String, Vec<Column>) {
        (self.name, self.columns)
    }
}

/// Parser for declarative schema files
#[derive(Debug, Clone, Default)]
pub struct ColumnarSchemaParser {
    path: Option<PathBuf>,
}

impl ColumnarSchemaParser {
    /// Create a parser reading from the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Path this parser reads from, falling back to [`DEFAULT_SCHEMA_PATH`]
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SCHEMA_PATH))
    }

    /// Parse the schema file. A missing file yields an empty map.
    pub fn parse(&self) -> SchemaMap {
        read_schema_file(self.path())
            .map(|content| Self::parse_content(&content))
            .unwrap_or_default()
    }

    /// Parse schema text
    pub fn parse_content(content: &str) -> SchemaMap {
        let mut tables = SchemaMap::new();
        let mut current: Option<OpenTable> = None;

        for line in content.lines() {
            let line = line.trim();

            if let Some(caps) = CREATE_TABLE_RE.captures(line) {
                // An unterminated block keeps only its own columns
                if let Some(open) = current.take() {
                    let (name, columns) = open.abandon();
                    tables.insert(name, columns);
                }
                current = Some(open_table(&caps[1], line));
                continue;
            }

            if current.is_some() && line == "end" {
                if let Some(open) = current.take() {
                    let (name, columns) = open.close();
                    tables.insert(name, columns);
                }
            } else if let Some(open) = current.as_mut() {
                if let Some(col) = parse_column(line) {
                    open.columns.push(col);
                }
            }
        }

        if let Some(open) = current.take() {
            let (name, columns) = open.abandon();
            tables.insert(name, columns);
        }

        tables
    }
}

fn open_table(name: &str, line: &str) -> OpenTable {
    let pk_type = if NO_ID_RE.is_match(line) {
        None
    } else {
        Some(
            ID_TYPE_RE
                .captures(line)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| DEFAULT_PK_TYPE.to_string()),
        )
    };

    OpenTable {
        name: name.to_string(),
        pk_type,
        columns: Vec::new(),
    }
}

/// Parse a `t.<type> "<name>", ...` line. Index declarations yield `None`.
fn parse_column(line: &str) -> Option<Column> {
    if line.starts_with("t.index") {
        return None;
    }

    let caps = COLUMN_RE.captures(line)?;
    let options = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    Some(Column {
        name: caps[2].to_string(),
        col_type: caps[1].to_string(),
        nullable: !NOT_NULL_RE.is_match(options),
        default: extract_default(options),
        primary: false,
    })
}

fn extract_default(options: &str) -> Option<String> {
    if let Some(caps) = DEFAULT_LITERAL_RE.captures(options) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string());
    }
    DEFAULT_BOOL_RE
        .captures(options)
        .map(|caps| caps[1].to_string())
}
