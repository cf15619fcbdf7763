//! SQL structure dump parsing.
//!
//! Extracts column definitions from `CREATE TABLE` statements:
//! - Schema-qualified and double-quoted table names
//! - Compound SQL types (`character varying`, `timestamp without time zone`)
//! - `NOT NULL`, `DEFAULT` and inline `PRIMARY KEY` column modifiers
//! - `PRIMARY KEY (...)` table constraints, including those added later by
//!   `ALTER TABLE ... ADD CONSTRAINT ... PRIMARY KEY (...)`

use super::{read_schema_file, Column, SchemaMap};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Default path of the SQL structure dump, relative to the project root
pub const DEFAULT_STRUCTURE_PATH: &str = "db/structure.sql";

/// Regex for the head of a CREATE TABLE statement, up to the opening paren
static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bCREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?([\w."]+)\s*\("#).unwrap()
});

/// Regex for primary keys attached after the fact (pg_dump style)
static ALTER_TABLE_PK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bALTER\s+TABLE\s+(?:ONLY\s+)?([\w."]+)\s+ADD\s+CONSTRAINT\s+[\w"]+\s+PRIMARY\s+KEY\s*\(([^)]+)\)"#,
    )
    .unwrap()
});

/// Regex for a PRIMARY KEY table constraint
static PK_CONSTRAINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)PRIMARY\s+KEY\s*\(([^)]+)\)").unwrap());

/// Body lines that never describe a column
static CONSTRAINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\A(?:CONSTRAINT|UNIQUE|CHECK|EXCLUDE|FOREIGN\s+KEY)\b").unwrap());

/// Regex for `<name> <rest>` column lines
static COLUMN_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\A("?\w+"?)\s+(.+)"#).unwrap());

/// Multi-word SQL types that must be matched before falling back to the first word
static COMPOUND_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\A(character\s+varying|bit\s+varying|double\s+precision|timestamp(?:\(\d+\))?\s+with(?:out)?\s+time\s+zone|time(?:\(\d+\))?\s+with(?:out)?\s+time\s+zone)",
    )
    .unwrap()
});

static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\AFOREIGN\s+KEY\b").unwrap());

static FIRST_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A(\w+)").unwrap());

static PRECISION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d+\)").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

/// Quoted string default, with an optional `::type` cast that is discarded
static DEFAULT_STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\s+'([^']*)'(?:::[\w ]+)?").unwrap());

static DEFAULT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\s+(\d+(?:\.\d+)?)\b").unwrap());

static DEFAULT_BOOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\s+(true|false)\b").unwrap());

/// Map a normalized SQL type to its logical type. Unknown types pass through.
pub fn logical_type(sql_type: &str) -> String {
    let mapped = match sql_type {
        "character varying" | "varchar" => "string",
        "integer" | "smallint" | "serial" => "integer",
        "bigint" | "bigserial" => "bigint",
        "boolean" => "boolean",
        "text" => "text",
        "timestamp without time zone" | "timestamp with time zone" | "timestamp" => "datetime",
        "json" => "json",
        "jsonb" => "jsonb",
        "uuid" => "uuid",
        "numeric" | "decimal" | "money" => "decimal",
        "date" => "date",
        "float" | "double precision" | "real" => "float",
        "bytea" => "binary",
        other => other,
    };
    mapped.to_string()
}

/// Parser for SQL structure dumps
#[derive(Debug, Clone, Default)]
pub struct SqlDdlParser {
    path: Option<PathBuf>,
}

impl SqlDdlParser {
    /// Create a parser reading from the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Path this parser reads from, falling back to [`DEFAULT_STRUCTURE_PATH`]
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_STRUCTURE_PATH))
    }

    /// Parse the structure file. A missing file yields an empty map.
    pub fn parse(&self) -> SchemaMap {
        read_schema_file(self.path())
            .map(|content| Self::parse_content(&content))
            .unwrap_or_default()
    }

    /// Parse SQL text
    pub fn parse_content(content: &str) -> SchemaMap {
        let mut tables = SchemaMap::new();
        let mut pos = 0;

        while let Some(caps) = CREATE_TABLE_RE.captures_at(content, pos) {
            let (Some(whole), Some(raw_name)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            // The match ends just past the opening paren
            let open = whole.end() - 1;
            let Some((body, close)) = extract_table_body(content, open) else {
                break;
            };

            let (mut columns, pk_columns) = parse_table_body(body);
            mark_primary(&mut columns, &pk_columns);
            tables.insert(table_name(raw_name.as_str()), columns);

            pos = close + 1;
        }

        for caps in ALTER_TABLE_PK_RE.captures_iter(content) {
            let name = table_name(&caps[1]);
            if let Some(columns) = tables.get_mut(&name) {
                mark_primary(columns, &parse_column_list(&caps[2]));
            }
        }

        tables
    }
}

/// Strip identifier quoting and keep only the last segment of `schema.table`
fn table_name(raw: &str) -> String {
    let unquoted = unquote(raw);
    unquoted
        .rsplit('.')
        .next()
        .unwrap_or(unquoted.as_str())
        .to_string()
}

fn unquote(identifier: &str) -> String {
    identifier.replace('"', "")
}

/// Mark the named columns primary. Names that match no column are ignored.
fn mark_primary(columns: &mut [Column], names: &[String]) {
    for name in names {
        if let Some(col) = columns.iter_mut().find(|c| &c.name == name) {
            col.primary = true;
        }
    }
}

/// Find the body between the paren at `open` and its matching close paren.
/// Returns the body and the byte offset of the closing paren.
fn extract_table_body(content: &str, open: usize) -> Option<(&str, usize)> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut in_comment = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_comment {
            in_comment = b != b'\n';
            continue;
        }
        if b == b'\'' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match b {
            b'-' if bytes.get(i + 1) == Some(&b'-') => in_comment = true,
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some((&content[open + 1..i], i));
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a table body into columns plus the names listed by PRIMARY KEY constraints
fn parse_table_body(body: &str) -> (Vec<Column>, Vec<String>) {
    let mut columns = Vec::new();
    let mut pk_columns = Vec::new();

    for part in split_table_body(body) {
        let line = part.trim().trim_end_matches(',').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = PK_CONSTRAINT_RE.captures(line) {
            pk_columns.extend(parse_column_list(&caps[1]));
        } else if !CONSTRAINT_RE.is_match(line) {
            if let Some((col, inline_pk)) = parse_column_line(line) {
                if inline_pk {
                    pk_columns.push(col.name.clone());
                }
                columns.push(col);
            }
        }
    }

    (columns, pk_columns)
}

/// Split a table body on top-level commas, skipping `--` comments
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_string {
            if ch == '\'' {
                in_string = false;
            }
            current.push(ch);
            continue;
        }

        match ch {
            '\'' => {
                in_string = true;
                current.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                current.push('\n');
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse `<name> <type> [modifiers]`. The flag reports an inline PRIMARY KEY.
fn parse_column_line(line: &str) -> Option<(Column, bool)> {
    let caps = COLUMN_DEF_RE.captures(line)?;
    let rest = caps.get(2)?.as_str();
    let sql_type = extract_type(rest)?;

    let col = Column {
        name: unquote(&caps[1]),
        col_type: logical_type(&sql_type),
        nullable: !NOT_NULL_RE.is_match(rest),
        default: extract_default(rest),
        primary: false,
    };

    Some((col, INLINE_PRIMARY_KEY_RE.is_match(rest)))
}

/// Normalized SQL type of a column: lowercased, precision stripped
fn extract_type(rest: &str) -> Option<String> {
    if let Some(caps) = COMPOUND_TYPE_RE.captures(rest) {
        let lowered = caps[1].to_lowercase();
        let stripped = PRECISION_RE.replace_all(&lowered, "");
        return Some(WHITESPACE_RE.replace_all(&stripped, " ").into_owned());
    }
    if FOREIGN_KEY_RE.is_match(rest) {
        return None;
    }
    FIRST_WORD_RE
        .captures(rest)
        .map(|caps| caps[1].to_lowercase())
}

fn extract_default(rest: &str) -> Option<String> {
    if let Some(caps) = DEFAULT_STRING_RE
        .captures(rest)
        .or_else(|| DEFAULT_NUMBER_RE.captures(rest))
    {
        return Some(caps[1].to_string());
    }
    DEFAULT_BOOL_RE
        .captures(rest)
        .map(|caps| caps[1].to_lowercase())
}

/// Parse a comma-separated column list, stripping double quotes
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| unquote(c.trim()))
        .filter(|c| !c.is_empty())
        .collect()
}
