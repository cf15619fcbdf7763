//! End-to-end generation: schema resolution, entity scanning, graph assembly
//! and artifact output.

use crate::config::Config;
use crate::extractor::ModelScanner;
use crate::graph::format::to_json;
use crate::graph::{GraphBuilder, GraphDocument, HtmlGenerator, OutputFormat};
use crate::provider::{EntityProvider, ManifestProvider, SchemaProvider};
use crate::schema::{ResolvedSchema, SchemaSource};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs the pipeline for one configuration
#[derive(Debug, Clone)]
pub struct Generator {
    config: Config,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse the configured schema source(s)
    pub fn resolve_schema(&self) -> ResolvedSchema {
        SchemaSource::new(
            self.config.schema_format,
            &self.config.schema_path,
            &self.config.structure_path,
        )
        .resolve()
    }

    /// Scan the provider and assemble the graph. Schema tables, when present,
    /// decide which entities have a table and supply their columns.
    pub fn build(&self, provider: &dyn EntityProvider, schema: &ResolvedSchema) -> GraphDocument {
        let tables = schema.authoritative();
        let entities = ModelScanner::new(self.config.exclude_models.clone()).scan(provider, tables);

        GraphBuilder::new(tables)
            .with_source_version(provider.source_version())
            .build(&entities)
    }

    /// Resolve the schema, pick the provider and build the document
    pub fn document(&self) -> Result<GraphDocument> {
        let schema = self.resolve_schema();

        match &self.config.models_path {
            Some(path) => {
                let provider = ManifestProvider::load(path)?;
                info!("Loaded {} models from {}", provider.len(), path.display());
                Ok(self.build(&provider, &schema))
            }
            None => {
                let provider = SchemaProvider::new(&schema.tables);
                Ok(self.build(&provider, &schema))
            }
        }
    }

    /// Where the artifact goes. A path whose extension names the other format
    /// gets this format's extension instead.
    pub fn output_path(&self) -> PathBuf {
        let path = &self.config.output_path;
        let format = self.config.format;
        match path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
        {
            Some(detected) if detected != format => path.with_extension(format.extension()),
            _ => path.clone(),
        }
    }

    /// Write a built document in the configured format
    pub fn write(&self, doc: &GraphDocument) -> Result<PathBuf> {
        let path = self.output_path();
        match self.config.format {
            OutputFormat::Html => HtmlGenerator::new(doc, &self.config).render_to_file(Some(&path)),
            OutputFormat::Json => {
                write_file(&path, &to_json(doc))?;
                Ok(path)
            }
        }
    }

    /// Build and write the artifact, returning the written path
    pub fn run(&self) -> Result<PathBuf> {
        let doc = self.document()?;
        self.write(&doc)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("could not write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AssociationType;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
ActiveRecord::Schema[7.1].define(version: 2024_01_01_000000) do
  create_table "users", force: :cascade do |t|
    t.string "email", null: false
  end

  create_table "posts", force: :cascade do |t|
    t.bigint "user_id", null: false
    t.string "title"
  end
end
"#;

    fn config(dir: &TempDir) -> Config {
        let schema_path = dir.path().join("db/schema.rb");
        fs::create_dir_all(schema_path.parent().unwrap()).unwrap();
        fs::write(&schema_path, SCHEMA).unwrap();
        Config {
            schema_path,
            structure_path: dir.path().join("db/structure.sql"),
            output_path: dir.path().join("out/schema.html"),
            ..Config::default()
        }
    }

    #[test]
    fn test_document_from_schema() {
        let dir = TempDir::new().unwrap();
        let doc = Generator::new(config(&dir)).document().unwrap();

        let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Post", "User"]);
        assert_eq!(doc.metadata.model_count, 2);
        assert!(doc.edges.iter().any(|e| e.from == "Post"
            && e.to == "User"
            && e.association_type == AssociationType::BelongsTo));
    }

    #[test]
    fn test_exclusion_drops_edges() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            exclude_models: vec!["Us*".to_string()],
            ..config(&dir)
        };
        let doc = Generator::new(config).document().unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn test_run_writes_html() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(config(&dir));
        let path = generator.run().unwrap();
        assert_eq!(path, dir.path().join("out/schema.html"));
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("window.__SCHEMA_DATA__"));
    }

    #[test]
    fn test_json_swaps_extension() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            format: OutputFormat::Json,
            ..config(&dir)
        };
        let path = Generator::new(config).run().unwrap();
        assert_eq!(path, dir.path().join("out/schema.json"));
        let doc: GraphDocument = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(doc.nodes.len(), 2);
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            models_path: Some(dir.path().join("models.yml")),
            ..config(&dir)
        };
        assert!(Generator::new(config).document().is_err());
    }

    #[test]
    fn test_manifest_with_schema_columns() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("models.yml");
        fs::write(
            &manifest,
            "version: \"7.1.3\"\nmodels:\n  - name: User\n    associations:\n      - { macro: has_many, name: posts }\n  - name: Post\n  - name: Ghost\n",
        )
        .unwrap();
        let config = Config {
            models_path: Some(manifest),
            ..config(&dir)
        };
        let doc = Generator::new(config).document().unwrap();

        // Ghost has no table in the schema
        let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Post", "User"]);
        assert_eq!(doc.metadata.source_version.as_deref(), Some("7.1.3"));
        assert_eq!(doc.node("User").unwrap().columns.len(), 2);
        assert_eq!(doc.edges.len(), 1);
    }
}
