//! JSON Schema generation for the documents the CLI writes.
//!
//! Schemas are generated with schemars and exported via the `schema` subcommand.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// All published schemas by name.
/// BTreeMap keeps the output order stable.
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    // graph document, embedded in HTML and written by --format json
    schemas.insert("graph", schema_for!(crate::graph::GraphDocument));

    schemas
}

/// A single schema by name
pub fn get_schema(name: &str) -> Option<Schema> {
    all_schemas().remove(name)
}

/// Names of all available schemas
pub fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_schema_lists_document_fields() {
        let schema = get_schema("graph").unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        let required = value["required"].as_array().unwrap();
        for field in ["nodes", "edges", "metadata"] {
            assert!(required.iter().any(|r| r == field), "missing {}", field);
        }
    }

    #[test]
    fn test_unknown_schema() {
        assert!(get_schema("split").is_none());
        assert_eq!(schema_names(), vec!["graph"]);
    }
}
