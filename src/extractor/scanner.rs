//! Entity discovery.

use crate::provider::{Entity, EntityProvider};
use crate::schema::SchemaMap;
use tracing::{debug, warn};

/// Selects the entities that become diagram nodes
#[derive(Debug, Clone, Default)]
pub struct ModelScanner {
    exclude_models: Vec<String>,
}

impl ModelScanner {
    /// Create a scanner. Entries ending in `*` match entity names by prefix,
    /// any other entry matches exactly.
    pub fn new(exclude_models: Vec<String>) -> Self {
        Self { exclude_models }
    }

    /// Concrete, named, table-backed and not excluded entities, sorted by name.
    ///
    /// When `schema` is non-empty it decides table existence; otherwise the
    /// entity is asked, and an error counts as "no table".
    pub fn scan<'a>(
        &self,
        provider: &'a dyn EntityProvider,
        schema: Option<&SchemaMap>,
    ) -> Vec<&'a dyn Entity> {
        let entities = match provider.list_entities() {
            Ok(entities) => entities,
            Err(e) => {
                warn!("Could not list entities: {}", e);
                return Vec::new();
            }
        };
        let schema = schema.filter(|s| !s.is_empty());

        let mut selected: Vec<&dyn Entity> = entities
            .into_iter()
            .filter(|e| !e.is_abstract())
            .filter(|e| e.name().is_some())
            .filter(|e| table_exists(*e, schema))
            .filter(|e| !self.is_excluded(e.name().unwrap_or_default()))
            .collect();

        selected.sort_by(|a, b| a.name().cmp(&b.name()));
        debug!("scanned {} entities", selected.len());
        selected
    }

    /// Whether an entity name matches any exclusion pattern
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_models
            .iter()
            .any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => name == pattern,
            })
    }
}

fn table_exists(entity: &dyn Entity, schema: Option<&SchemaMap>) -> bool {
    if let Some(schema) = schema {
        return schema.contains_key(entity.table_name());
    }
    match entity.table_exists() {
        Ok(exists) => exists,
        Err(e) => {
            debug!("table check failed for {}: {}", entity.table_name(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, StaticEntity};
    use crate::schema::Column;

    struct Fixture(Vec<StaticEntity>);

    impl EntityProvider for Fixture {
        fn list_entities(&self) -> Result<Vec<&dyn Entity>, ProviderError> {
            Ok(self.0.iter().map(|e| e as &dyn Entity).collect())
        }
    }

    struct Broken;

    impl EntityProvider for Broken {
        fn list_entities(&self) -> Result<Vec<&dyn Entity>, ProviderError> {
            Err(ProviderError::Other("boot failed".to_string()))
        }
    }

    fn entity(name: &str, table: &str) -> StaticEntity {
        StaticEntity {
            name: Some(name.to_string()),
            table_name: table.to_string(),
            table_exists: true,
            ..Default::default()
        }
    }

    fn fixture() -> Fixture {
        Fixture(vec![
            entity("User", "users"),
            entity("Admin::Audit", "audits"),
            entity("Comment", "comments"),
            StaticEntity {
                is_abstract: true,
                ..entity("ApplicationRecord", "")
            },
            StaticEntity {
                name: None,
                ..entity("", "anonymous")
            },
            StaticEntity {
                table_exists: false,
                ..entity("Pending", "pendings")
            },
        ])
    }

    fn names(entities: &[&dyn Entity]) -> Vec<String> {
        entities
            .iter()
            .filter_map(|e| e.name().map(String::from))
            .collect()
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let provider = fixture();
        let scanned = ModelScanner::default().scan(&provider, None);
        assert_eq!(names(&scanned), vec!["Admin::Audit", "Comment", "User"]);
    }

    #[test]
    fn test_exclusion_patterns() {
        let provider = fixture();
        let scanner = ModelScanner::new(vec!["Admin::*".to_string(), "Comment".to_string()]);
        let scanned = scanner.scan(&provider, None);
        assert_eq!(names(&scanned), vec!["User"]);
        assert!(!scanner.is_excluded("Commentary"));
    }

    #[test]
    fn test_schema_decides_table_existence() {
        let provider = fixture();
        let mut schema = SchemaMap::new();
        schema.insert("pendings".to_string(), vec![Column::primary_key("integer")]);
        schema.insert("users".to_string(), vec![Column::primary_key("integer")]);

        let scanned = ModelScanner::default().scan(&provider, Some(&schema));
        assert_eq!(names(&scanned), vec!["Pending", "User"]);
    }

    #[test]
    fn test_provider_failure_yields_empty_scan() {
        assert!(ModelScanner::default().scan(&Broken, None).is_empty());
    }
}
