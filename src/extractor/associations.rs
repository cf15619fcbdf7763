//! Association reading for a single entity.

use crate::graph::{AssociationType, Edge};
use crate::provider::{Entity, ProviderError, Reflection};
use tracing::warn;

/// Turns an entity's association declarations into edges
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociationReader;

impl AssociationReader {
    pub fn new() -> Self {
        Self
    }

    /// One edge per readable association, in declaration order.
    ///
    /// Polymorphic `belongs_to` associations have no fixed target and are
    /// skipped. A failing association is logged and skipped without affecting
    /// the others.
    pub fn read(&self, entity: &dyn Entity) -> Vec<Edge> {
        let owner = entity.name().unwrap_or(entity.table_name());
        let reflections = match entity.associations() {
            Ok(reflections) => reflections,
            Err(e) => {
                warn!("Could not read associations for {}: {}", owner, e);
                return Vec::new();
            }
        };

        reflections
            .into_iter()
            .filter(|r| !is_polymorphic_owner(*r))
            .filter_map(|r| match build_edge(owner, r) {
                Ok(edge) => Some(edge),
                Err(e) => {
                    warn!("Could not read association {} on {}: {}", r.name(), owner, e);
                    None
                }
            })
            .collect()
    }
}

fn is_polymorphic_owner(reflection: &dyn Reflection) -> bool {
    reflection.macro_type() == AssociationType::BelongsTo && reflection.options().polymorphic
}

fn build_edge(owner: &str, reflection: &dyn Reflection) -> Result<Edge, ProviderError> {
    let options = reflection.options();
    Ok(Edge {
        from: owner.to_string(),
        to: target_name(reflection),
        association_type: reflection.macro_type(),
        label: reflection.name().to_string(),
        foreign_key: Some(reflection.foreign_key()?),
        through: options.through.clone(),
        polymorphic: options.as_.is_some(),
    })
}

fn target_name(reflection: &dyn Reflection) -> String {
    reflection.klass().unwrap_or_else(|e| {
        warn!("Could not resolve target for {}: {}", reflection.name(), e);
        reflection.class_name()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AssociationOptions, StaticEntity, StaticReflection};

    fn reflection(macro_type: AssociationType, name: &str, target: &str) -> StaticReflection {
        StaticReflection {
            macro_type,
            name: name.to_string(),
            options: AssociationOptions::default(),
            resolved_target: Some(target.to_string()),
            declared_target: target.to_string(),
            foreign_key: Some(format!("{}_id", name)),
        }
    }

    fn comment() -> StaticEntity {
        StaticEntity {
            name: Some("Comment".to_string()),
            table_name: "comments".to_string(),
            table_exists: true,
            associations: vec![
                reflection(AssociationType::BelongsTo, "post", "Post"),
                StaticReflection {
                    options: AssociationOptions {
                        polymorphic: true,
                        ..Default::default()
                    },
                    resolved_target: None,
                    ..reflection(AssociationType::BelongsTo, "commentable", "Commentable")
                },
                StaticReflection {
                    options: AssociationOptions {
                        as_: Some("reactable".to_string()),
                        ..Default::default()
                    },
                    foreign_key: Some("reactable_id".to_string()),
                    ..reflection(AssociationType::HasMany, "reactions", "Reaction")
                },
                StaticReflection {
                    resolved_target: None,
                    ..reflection(AssociationType::HasOne, "attachment", "Attachment")
                },
                StaticReflection {
                    options: AssociationOptions {
                        through: Some("missing".to_string()),
                        ..Default::default()
                    },
                    foreign_key: None,
                    ..reflection(AssociationType::HasMany, "tags", "Tag")
                },
                StaticReflection {
                    options: AssociationOptions {
                        through: Some("post".to_string()),
                        ..Default::default()
                    },
                    ..reflection(AssociationType::HasOne, "author", "User")
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_polymorphic_belongs_to_skipped() {
        let edges = AssociationReader::new().read(&comment());
        assert!(edges.iter().all(|e| e.label != "commentable"));
        assert!(edges
            .iter()
            .all(|e| !(e.association_type == AssociationType::BelongsTo && e.polymorphic)));
    }

    #[test]
    fn test_edge_fields() {
        let edges = AssociationReader::new().read(&comment());
        let labels: Vec<&str> = edges.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["post", "reactions", "attachment", "author"]);

        assert_eq!(edges[0].from, "Comment");
        assert_eq!(edges[0].to, "Post");
        assert_eq!(edges[0].foreign_key.as_deref(), Some("post_id"));
        assert!(!edges[0].polymorphic);

        assert!(edges[1].polymorphic);
        assert_eq!(edges[1].foreign_key.as_deref(), Some("reactable_id"));

        assert_eq!(edges[3].through.as_deref(), Some("post"));
    }

    #[test]
    fn test_unresolved_target_uses_declared_type() {
        let edges = AssociationReader::new().read(&comment());
        let attachment = edges.iter().find(|e| e.label == "attachment").unwrap();
        assert_eq!(attachment.to, "Attachment");
    }

    #[test]
    fn test_failing_association_is_isolated() {
        let edges = AssociationReader::new().read(&comment());
        assert!(edges.iter().all(|e| e.label != "tags"));
        assert_eq!(edges.len(), 4);
    }
}
