//! Entity provider boundary.
//!
//! Everything the pipeline knows about the application's data model comes
//! through [`EntityProvider`]. Two implementations ship with the crate:
//! - [`ManifestProvider`]: a YAML model manifest standing in for live reflection
//! - [`SchemaProvider`]: entities and associations inferred from parsed schema tables

mod manifest;
mod schema;

pub use manifest::*;
pub use schema::*;

use crate::graph::AssociationType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by providers. Per-entity and per-association failures are
/// always recovered by the extractors.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("could not read model manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model manifest: {0}")]
    ManifestParse(#[from] serde_yaml::Error),
    #[error("columns are not available for {0}")]
    ColumnsUnavailable(String),
    #[error("could not find target entity {target} for association {association}")]
    UnresolvedTarget { association: String, target: String },
    #[error("could not find the association {through} named by {association} (through)")]
    MissingThrough { association: String, through: String },
    #[error("{0}")]
    Other(String),
}

/// Column as reported by live introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
    #[serde(default = "default_null")]
    pub null: bool,
    #[serde(default)]
    pub default: Option<String>,
}

fn default_null() -> bool {
    true
}

/// Options attached to an association declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationOptions {
    /// Intermediate association for `through` associations
    pub through: Option<String>,
    /// Polymorphic interface this association is the inverse side of
    #[serde(rename = "as")]
    pub as_: Option<String>,
    /// The association has no fixed target type
    pub polymorphic: bool,
    pub class_name: Option<String>,
    pub foreign_key: Option<String>,
}

/// Source of entities
pub trait EntityProvider {
    /// All entities known to the provider, including abstract and excluded ones
    fn list_entities(&self) -> Result<Vec<&dyn Entity>, ProviderError>;

    /// Version of the framework the entities come from, when known
    fn source_version(&self) -> Option<String> {
        None
    }
}

/// One data-model unit
pub trait Entity {
    /// Entity name; `None` for anonymous entities
    fn name(&self) -> Option<&str>;
    fn table_name(&self) -> &str;
    fn is_abstract(&self) -> bool;
    fn table_exists(&self) -> Result<bool, ProviderError>;
    fn primary_key(&self) -> Option<&str>;
    fn columns(&self) -> Result<Vec<RawColumn>, ProviderError>;
    fn associations(&self) -> Result<Vec<&dyn Reflection>, ProviderError>;
}

/// Association metadata as declared on an entity
pub trait Reflection {
    fn macro_type(&self) -> AssociationType;
    fn name(&self) -> &str;
    fn options(&self) -> &AssociationOptions;
    /// Resolve the live target entity name
    fn klass(&self) -> Result<String, ProviderError>;
    /// Declared target type name, used when `klass` cannot be resolved
    fn class_name(&self) -> String;
    fn foreign_key(&self) -> Result<String, ProviderError>;
}

/// Plain-data [`Entity`] shared by the bundled providers
#[derive(Debug, Clone, Default)]
pub struct StaticEntity {
    pub name: Option<String>,
    pub table_name: String,
    pub is_abstract: bool,
    pub table_exists: bool,
    pub primary_key: Option<String>,
    /// `None` when the provider has no column information
    pub columns: Option<Vec<RawColumn>>,
    pub associations: Vec<StaticReflection>,
}

impl Entity for StaticEntity {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    fn table_exists(&self) -> Result<bool, ProviderError> {
        Ok(self.table_exists)
    }

    fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    fn columns(&self) -> Result<Vec<RawColumn>, ProviderError> {
        self.columns.clone().ok_or_else(|| {
            ProviderError::ColumnsUnavailable(
                self.name.clone().unwrap_or_else(|| self.table_name.clone()),
            )
        })
    }

    fn associations(&self) -> Result<Vec<&dyn Reflection>, ProviderError> {
        Ok(self
            .associations
            .iter()
            .map(|a| a as &dyn Reflection)
            .collect())
    }
}

/// Plain-data [`Reflection`] shared by the bundled providers
#[derive(Debug, Clone)]
pub struct StaticReflection {
    pub macro_type: AssociationType,
    pub name: String,
    pub options: AssociationOptions,
    /// Target entity, when it is known to the provider
    pub resolved_target: Option<String>,
    pub declared_target: String,
    /// `None` when the key cannot be determined (a `through` naming an unknown association)
    pub foreign_key: Option<String>,
}

impl Reflection for StaticReflection {
    fn macro_type(&self) -> AssociationType {
        self.macro_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &AssociationOptions {
        &self.options
    }

    fn klass(&self) -> Result<String, ProviderError> {
        self.resolved_target
            .clone()
            .ok_or_else(|| ProviderError::UnresolvedTarget {
                association: self.name.clone(),
                target: self.declared_target.clone(),
            })
    }

    fn class_name(&self) -> String {
        self.declared_target.clone()
    }

    fn foreign_key(&self) -> Result<String, ProviderError> {
        self.foreign_key
            .clone()
            .ok_or_else(|| ProviderError::MissingThrough {
                association: self.name.clone(),
                through: self.options.through.clone().unwrap_or_default(),
            })
    }
}
