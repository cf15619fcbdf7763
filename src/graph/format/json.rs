//! JSON output of the graph document.

use crate::graph::GraphDocument;

/// Pretty-printed graph document
pub fn to_json(doc: &GraphDocument) -> String {
    serde_json::to_string_pretty(doc).unwrap_or_else(|_| "{}".to_string())
}
