//! Graph document: the typed entity/association graph handed to the renderer.
//!
//! This module provides:
//! - The node, edge and metadata types serialized into the artifact
//! - Graph assembly from scanned entities (dangling edges dropped)
//! - Output formats: interactive HTML and plain JSON

pub mod builder;
pub mod format;

pub use builder::GraphBuilder;
pub use format::{HtmlGenerator, OutputFormat};

use crate::schema::Column;
use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of association declared between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssociationType {
    BelongsTo,
    HasMany,
    HasOne,
    HasAndBelongsToMany,
}

impl AssociationType {
    /// Whether the foreign key lives on the declaring side
    pub fn is_owning(self) -> bool {
        matches!(self, AssociationType::BelongsTo)
    }

    /// Whether the association targets a collection
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            AssociationType::HasMany | AssociationType::HasAndBelongsToMany
        )
    }

    /// Snake-case name as used in the document and CSS classes
    pub fn as_str(self) -> &'static str {
        match self {
            AssociationType::BelongsTo => "belongs_to",
            AssociationType::HasMany => "has_many",
            AssociationType::HasOne => "has_one",
            AssociationType::HasAndBelongsToMany => "has_and_belongs_to_many",
        }
    }
}

impl FromStr for AssociationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "belongs_to" => Ok(AssociationType::BelongsTo),
            "has_many" => Ok(AssociationType::HasMany),
            "has_one" => Ok(AssociationType::HasOne),
            "has_and_belongs_to_many" | "habtm" => Ok(AssociationType::HasAndBelongsToMany),
            _ => Err(format!(
                "Unknown association type: {}. Valid options: belongs_to, has_many, has_one, has_and_belongs_to_many",
                s
            )),
        }
    }
}

impl fmt::Display for AssociationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity in the diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    /// Entity name, unique within the document
    pub id: String,
    /// Backing table
    pub table_name: String,
    /// Columns in declaration order
    pub columns: Vec<Column>,
}

impl Node {
    /// First primary-key column, if any
    pub fn primary_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary)
    }
}

/// A directed association from the declaring entity to its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub association_type: AssociationType,
    /// Association name as declared
    pub label: String,
    pub foreign_key: Option<String>,
    /// Name of the intermediate association for `through` associations
    pub through: Option<String>,
    /// True on the inverse side of a polymorphic relation (`as:`)
    pub polymorphic: bool,
}

impl Edge {
    /// Whether the edge starts and ends at the same entity
    pub fn is_self_referential(&self) -> bool {
        self.from == self.to
    }

    /// Whether the edge touches the given node
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    /// The endpoint opposite to `id`
    pub fn other_end(&self, id: &str) -> &str {
        if self.from == id {
            &self.to
        } else {
            &self.from
        }
    }
}

/// Generation metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    /// RFC 3339 UTC timestamp, second precision
    pub generated_at: String,
    pub model_count: usize,
    /// Version of the framework the entities were read from, when known
    pub source_version: Option<String>,
}

impl Metadata {
    pub fn new(generated_at: DateTime<Utc>, model_count: usize, source_version: Option<String>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            model_count,
            source_version,
        }
    }
}

/// The complete graph embedded into the artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metadata: Metadata,
}

impl GraphDocument {
    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges touching the given node, in document order
    pub fn incident_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Total number of columns across all nodes
    pub fn column_count(&self) -> usize {
        self.nodes.iter().map(|n| n.columns.len()).sum()
    }
}
