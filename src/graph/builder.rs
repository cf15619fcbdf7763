//! Graph assembly from scanned entities.

use super::{Edge, GraphDocument, Metadata, Node};
use crate::extractor::{AssociationReader, ColumnReader};
use crate::provider::Entity;
use crate::schema::SchemaMap;
use ahash::AHashSet;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Composes nodes and edges into a [`GraphDocument`]
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder<'a> {
    columns: ColumnReader<'a>,
    associations: AssociationReader,
    source_version: Option<String>,
}

impl<'a> GraphBuilder<'a> {
    /// Builder reading columns from `schema` when it has the entity's table
    pub fn new(schema: Option<&'a SchemaMap>) -> Self {
        Self {
            columns: ColumnReader::new(schema),
            associations: AssociationReader::new(),
            source_version: None,
        }
    }

    /// Framework version recorded in the metadata
    pub fn with_source_version(mut self, version: Option<String>) -> Self {
        self.source_version = version;
        self
    }

    /// Build the document, stamped with the current time
    pub fn build(&self, entities: &[&dyn Entity]) -> GraphDocument {
        self.build_at(entities, Utc::now())
    }

    /// Build the document with an explicit generation time.
    ///
    /// Edges whose endpoints are not both nodes are dropped silently: the
    /// target is usually an excluded entity. Node ids are unique; a later
    /// entity reusing a name is skipped with its associations.
    pub fn build_at(&self, entities: &[&dyn Entity], generated_at: DateTime<Utc>) -> GraphDocument {
        let mut ids: AHashSet<&str> = AHashSet::new();
        let mut kept: Vec<&dyn Entity> = Vec::with_capacity(entities.len());
        for &entity in entities {
            let Some(name) = entity.name() else {
                continue;
            };
            if ids.insert(name) {
                kept.push(entity);
            } else {
                warn!("Skipping duplicate entity {} (table {})", name, entity.table_name());
            }
        }

        let nodes: Vec<Node> = kept
            .iter()
            .filter_map(|entity| {
                Some(Node {
                    id: entity.name()?.to_string(),
                    table_name: entity.table_name().to_string(),
                    columns: self.columns.read(*entity),
                })
            })
            .collect();

        let edges: Vec<Edge> = kept
            .iter()
            .flat_map(|entity| self.associations.read(*entity))
            .filter(|edge| ids.contains(edge.from.as_str()) && ids.contains(edge.to.as_str()))
            .collect();

        GraphDocument {
            metadata: Metadata::new(generated_at, nodes.len(), self.source_version.clone()),
            nodes,
            edges,
        }
    }
}
