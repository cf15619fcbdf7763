//! Provider deriving entities from parsed schema tables.
//!
//! Used when no model manifest is available. Entities follow table naming
//! conventions and associations are inferred from `<name>_id` columns:
//! - `posts.user_id` with a `users` table gives `Post belongs_to :user` and
//!   `User has_many :posts`
//! - a table without a primary key whose only columns reference two tables is
//!   a join table: it yields a `has_and_belongs_to_many` pair instead of an entity

use super::{
    AssociationOptions, Entity, EntityProvider, ProviderError, RawColumn, StaticEntity,
    StaticReflection,
};
use crate::graph::AssociationType;
use crate::inflect::{classify, pluralize};
use crate::schema::{Column, SchemaMap};
use ahash::AHashSet;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Framework bookkeeping tables that never map to entities
pub const INTERNAL_TABLES: &[&str] = &["schema_migrations", "ar_internal_metadata"];

/// A `<name>_id` column pointing at an existing table
#[derive(Debug, Clone)]
struct Reference {
    column: String,
    name: String,
    table: String,
}

/// Provider inferring entities from a schema map
#[derive(Debug, Clone, Default)]
pub struct SchemaProvider {
    entities: Vec<StaticEntity>,
}

impl SchemaProvider {
    pub fn new(schema: &SchemaMap) -> Self {
        let tables: IndexMap<&str, &[Column]> = schema
            .iter()
            .filter(|(name, _)| !INTERNAL_TABLES.contains(&name.as_str()))
            .map(|(name, cols)| (name.as_str(), cols.as_slice()))
            .collect();

        let references: IndexMap<&str, Vec<Reference>> = tables
            .iter()
            .map(|(&table, &cols)| (table, find_references(cols, &tables)))
            .collect();

        let mut join_tables: Vec<&str> = Vec::new();
        for (&table, &cols) in &tables {
            if is_join_table(cols, &references[table]) {
                join_tables.push(table);
            }
        }

        let mut entities: IndexMap<&str, StaticEntity> = IndexMap::new();
        let mut names: AHashSet<String> = AHashSet::new();
        for (&table, &cols) in &tables {
            if join_tables.contains(&table) {
                continue;
            }
            let entity = entity_for_table(table, cols);
            let name = entity.name.clone().unwrap_or_default();
            if !names.insert(name.clone()) {
                warn!("Skipping table {}: entity {} is already defined", table, name);
                continue;
            }
            entities.insert(table, entity);
        }

        for (&table, refs) in &references {
            if join_tables.contains(&table) {
                add_join_associations(&mut entities, table, refs);
                continue;
            }
            if !entities.contains_key(table) {
                continue;
            }
            for reference in refs {
                add_reference_associations(&mut entities, table, reference);
            }
        }

        Self {
            entities: entities.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityProvider for SchemaProvider {
    fn list_entities(&self) -> Result<Vec<&dyn Entity>, ProviderError> {
        Ok(self.entities.iter().map(|e| e as &dyn Entity).collect())
    }
}

fn entity_for_table(table: &str, columns: &[Column]) -> StaticEntity {
    StaticEntity {
        name: Some(classify(table)),
        table_name: table.to_string(),
        is_abstract: false,
        table_exists: true,
        primary_key: columns.iter().find(|c| c.primary).map(|c| c.name.clone()),
        columns: Some(
            columns
                .iter()
                .map(|c| RawColumn {
                    name: c.name.clone(),
                    sql_type: c.col_type.clone(),
                    null: c.nullable,
                    default: c.default.clone(),
                })
                .collect(),
        ),
        associations: Vec::new(),
    }
}

fn find_references(columns: &[Column], tables: &IndexMap<&str, &[Column]>) -> Vec<Reference> {
    columns
        .iter()
        .filter_map(|col| {
            let name = col.name.strip_suffix("_id")?;
            if name.is_empty() {
                return None;
            }
            let table = pluralize(name);
            tables.contains_key(table.as_str()).then(|| Reference {
                column: col.name.clone(),
                name: name.to_string(),
                table,
            })
        })
        .collect()
}

fn is_join_table(columns: &[Column], references: &[Reference]) -> bool {
    columns.len() == 2
        && references.len() == 2
        && columns.iter().all(|c| !c.primary)
        && references[0].table != references[1].table
}

fn reflection(
    macro_type: AssociationType,
    name: &str,
    target: String,
    foreign_key: &str,
) -> StaticReflection {
    StaticReflection {
        macro_type,
        name: name.to_string(),
        options: AssociationOptions::default(),
        resolved_target: Some(target.clone()),
        declared_target: target,
        foreign_key: Some(foreign_key.to_string()),
    }
}

fn add_reference_associations(
    entities: &mut IndexMap<&str, StaticEntity>,
    table: &str,
    reference: &Reference,
) {
    let owner = classify(table);
    let target = classify(&reference.table);

    if let Some(entity) = entities.get_mut(table) {
        entity.associations.push(reflection(
            AssociationType::BelongsTo,
            &reference.name,
            target,
            &reference.column,
        ));
    }
    if let Some(entity) = entities.get_mut(reference.table.as_str()) {
        entity.associations.push(reflection(
            AssociationType::HasMany,
            table,
            owner,
            &reference.column,
        ));
    }
}

fn add_join_associations(
    entities: &mut IndexMap<&str, StaticEntity>,
    join_table: &str,
    refs: &[Reference],
) {
    let [left, right] = refs else {
        return;
    };

    for (this, other) in [(left, right), (right, left)] {
        if let Some(entity) = entities.get_mut(this.table.as_str()) {
            entity.associations.push(reflection(
                AssociationType::HasAndBelongsToMany,
                &other.table,
                classify(&other.table),
                &this.column,
            ));
        }
    }
    debug!("treating {} as a join table", join_table);
}
