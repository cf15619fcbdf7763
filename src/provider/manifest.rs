//! YAML model manifest provider.
//!
//! The manifest describes entities the way runtime reflection would report
//! them. Omitted values follow naming conventions:
//!
//! ```yaml
//! version: "7.1.3"
//! models:
//!   - name: User
//!     columns:
//!       - { name: id, type: integer, null: false }
//!       - { name: email, type: string }
//!     associations:
//!       - { macro: has_many, name: posts }
//!       - { macro: has_many, name: comments, options: { as: commentable } }
//!   - name: Post
//!     associations:
//!       - { macro: belongs_to, name: user }
//!       - { macro: belongs_to, name: author, options: { class_name: User } }
//! ```

use super::{
    AssociationOptions, Entity, EntityProvider, ProviderError, RawColumn, StaticEntity,
    StaticReflection,
};
use crate::graph::AssociationType;
use crate::inflect::{camelize, singularize, tableize, underscore};
use ahash::AHashSet;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Manifest file layout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Framework version reported in the document metadata
    pub version: Option<String>,
    pub models: Vec<ModelEntry>,
}

/// One model in the manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelEntry {
    pub name: Option<String>,
    pub table: Option<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// Defaults to true for concrete models
    pub table_exists: Option<bool>,
    pub primary_key: Option<String>,
    pub columns: Option<Vec<RawColumn>>,
    pub associations: Vec<AssociationEntry>,
}

/// One association declaration in the manifest
#[derive(Debug, Clone, Deserialize)]
pub struct AssociationEntry {
    #[serde(rename = "macro")]
    pub macro_type: AssociationType,
    pub name: String,
    /// Explicit target entity; derived from the name when omitted
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub options: AssociationOptions,
}

/// Provider backed by a model manifest
#[derive(Debug, Clone, Default)]
pub struct ManifestProvider {
    version: Option<String>,
    entities: Vec<StaticEntity>,
}

impl ManifestProvider {
    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let content = fs::read_to_string(path).map_err(|source| ProviderError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse manifest text
    pub fn from_yaml(content: &str) -> Result<Self, ProviderError> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Build entities from an already parsed manifest
    pub fn from_manifest(manifest: Manifest) -> Self {
        let known: AHashSet<String> = manifest
            .models
            .iter()
            .filter_map(|m| m.name.clone())
            .collect();

        let entities = manifest
            .models
            .into_iter()
            .map(|model| build_entity(model, &known))
            .collect();

        Self {
            version: manifest.version,
            entities,
        }
    }

    /// Number of entities in the manifest
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityProvider for ManifestProvider {
    fn list_entities(&self) -> Result<Vec<&dyn Entity>, ProviderError> {
        Ok(self.entities.iter().map(|e| e as &dyn Entity).collect())
    }

    fn source_version(&self) -> Option<String> {
        self.version.clone()
    }
}

fn build_entity(model: ModelEntry, known: &AHashSet<String>) -> StaticEntity {
    let owner = model.name.clone().unwrap_or_default();
    let table_name = model.table.clone().unwrap_or_else(|| tableize(&owner));
    let declared: AHashSet<&str> = model.associations.iter().map(|a| a.name.as_str()).collect();

    let associations = model
        .associations
        .iter()
        .map(|entry| build_reflection(&owner, entry, &declared, known))
        .collect();

    StaticEntity {
        table_exists: model.table_exists.unwrap_or(!model.is_abstract),
        primary_key: Some(model.primary_key.unwrap_or_else(|| "id".to_string())),
        name: model.name,
        table_name,
        is_abstract: model.is_abstract,
        columns: model.columns,
        associations,
    }
}

fn build_reflection(
    owner: &str,
    entry: &AssociationEntry,
    declared: &AHashSet<&str>,
    known: &AHashSet<String>,
) -> StaticReflection {
    let declared_target = entry
        .target
        .clone()
        .or_else(|| entry.options.class_name.clone())
        .unwrap_or_else(|| default_target(entry.macro_type, &entry.name));

    let resolved_target = known.contains(&declared_target).then(|| declared_target.clone());

    let foreign_key = match &entry.options.through {
        Some(through) if !declared.contains(through.as_str()) => None,
        _ => Some(default_foreign_key(owner, entry)),
    };

    StaticReflection {
        macro_type: entry.macro_type,
        name: entry.name.clone(),
        options: entry.options.clone(),
        resolved_target,
        declared_target,
        foreign_key,
    }
}

/// Target type implied by an association name
fn default_target(macro_type: AssociationType, name: &str) -> String {
    if macro_type.is_collection() {
        camelize(&singularize(name))
    } else {
        camelize(name)
    }
}

fn default_foreign_key(owner: &str, entry: &AssociationEntry) -> String {
    if let Some(fk) = &entry.options.foreign_key {
        return fk.clone();
    }
    if entry.macro_type == AssociationType::BelongsTo {
        return format!("{}_id", entry.name);
    }
    if let Some(interface) = &entry.options.as_ {
        return format!("{}_id", interface);
    }
    let base = owner.rsplit("::").next().unwrap_or(owner);
    format!("{}_id", underscore(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
version: "7.1.3"
models:
  - name: ApplicationRecord
    abstract: true
  - name: User
    columns:
      - { name: id, type: integer, null: false }
      - { name: email, type: string }
    associations:
      - { macro: has_many, name: posts }
      - { macro: has_many, name: comments, options: { as: commentable } }
      - { macro: has_many, name: tags, options: { through: taggings } }
  - name: Post
    associations:
      - { macro: belongs_to, name: user }
      - { macro: belongs_to, name: author, options: { class_name: User, foreign_key: written_by } }
      - { macro: belongs_to, name: subject, options: { polymorphic: true } }
      - { macro: has_one, name: cover_image, target: Image }
"#;

    fn entity<'a>(provider: &'a ManifestProvider, name: &str) -> &'a dyn Entity {
        provider
            .list_entities()
            .unwrap()
            .into_iter()
            .find(|e| e.name() == Some(name))
            .unwrap()
    }

    #[test]
    fn test_entities_and_defaults() {
        let provider = ManifestProvider::from_yaml(MANIFEST).unwrap();
        assert_eq!(provider.len(), 3);
        assert_eq!(provider.source_version().as_deref(), Some("7.1.3"));

        let user = entity(&provider, "User");
        assert_eq!(user.table_name(), "users");
        assert_eq!(user.primary_key(), Some("id"));
        assert!(user.table_exists().unwrap());
        assert_eq!(user.columns().unwrap().len(), 2);

        let base = entity(&provider, "ApplicationRecord");
        assert!(base.is_abstract());
        assert!(!base.table_exists().unwrap());
    }

    #[test]
    fn test_missing_columns_fail() {
        let provider = ManifestProvider::from_yaml(MANIFEST).unwrap();
        assert!(entity(&provider, "Post").columns().is_err());
    }

    #[test]
    fn test_association_targets_and_keys() {
        let provider = ManifestProvider::from_yaml(MANIFEST).unwrap();
        let user = entity(&provider, "User");
        let assocs = user.associations().unwrap();

        assert_eq!(assocs[0].klass().unwrap(), "Post");
        assert_eq!(assocs[0].foreign_key().unwrap(), "user_id");
        assert_eq!(assocs[1].foreign_key().unwrap(), "commentable_id");
        // Comment is not declared: only the declared type is available
        assert!(assocs[1].klass().is_err());
        assert_eq!(assocs[1].class_name(), "Comment");
        // `through` names an association that does not exist
        assert!(assocs[2].foreign_key().is_err());

        let post = entity(&provider, "Post");
        let assocs = post.associations().unwrap();
        assert_eq!(assocs[0].klass().unwrap(), "User");
        assert_eq!(assocs[0].foreign_key().unwrap(), "user_id");
        assert_eq!(assocs[1].klass().unwrap(), "User");
        assert_eq!(assocs[1].foreign_key().unwrap(), "written_by");
        assert!(assocs[2].options().polymorphic);
        assert_eq!(assocs[3].class_name(), "Image");
        assert_eq!(assocs[3].macro_type(), AssociationType::HasOne);
    }

    #[test]
    fn test_invalid_manifest() {
        let err = ManifestProvider::from_yaml("models:\n  - name: X\n    associations:\n      - { macro: has_few, name: y }\n");
        assert!(matches!(err, Err(ProviderError::ManifestParse(_))));
    }

    #[test]
    fn test_missing_manifest_file() {
        let err = ManifestProvider::load(Path::new("/nonexistent/models.yml"));
        assert!(matches!(err, Err(ProviderError::ManifestRead { .. })));
    }
}
