//! Integration tests for entity scanning and graph assembly.

use chrono::{TimeZone, Utc};
use schema_diagram::extractor::ModelScanner;
use schema_diagram::graph::{AssociationType, GraphBuilder};
use schema_diagram::provider::{
    AssociationOptions, Entity, EntityProvider, ManifestProvider, ProviderError, RawColumn,
    Reflection, SchemaProvider, StaticEntity, StaticReflection,
};
use schema_diagram::schema::{ColumnarSchemaParser, SchemaMap};

fn raw(name: &str, sql_type: &str, null: bool) -> RawColumn {
    RawColumn {
        name: name.to_string(),
        sql_type: sql_type.to_string(),
        null,
        default: None,
    }
}

fn reflection(macro_type: AssociationType, name: &str, target: &str, fk: &str) -> StaticReflection {
    StaticReflection {
        macro_type,
        name: name.to_string(),
        options: AssociationOptions::default(),
        resolved_target: Some(target.to_string()),
        declared_target: target.to_string(),
        foreign_key: Some(fk.to_string()),
    }
}

fn entity(name: &str, table: &str, columns: Vec<RawColumn>, assocs: Vec<StaticReflection>) -> StaticEntity {
    StaticEntity {
        name: Some(name.to_string()),
        table_name: table.to_string(),
        is_abstract: false,
        table_exists: true,
        primary_key: Some("id".to_string()),
        columns: Some(columns),
        associations: assocs,
    }
}

/// An entity whose reflection calls all fail
struct Broken;

impl Entity for Broken {
    fn name(&self) -> Option<&str> {
        Some("Broken")
    }
    fn table_name(&self) -> &str {
        "brokens"
    }
    fn is_abstract(&self) -> bool {
        false
    }
    fn table_exists(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
    fn primary_key(&self) -> Option<&str> {
        Some("id")
    }
    fn columns(&self) -> Result<Vec<RawColumn>, ProviderError> {
        Err(ProviderError::Other("connection lost".to_string()))
    }
    fn associations(&self) -> Result<Vec<&dyn Reflection>, ProviderError> {
        Err(ProviderError::Other("connection lost".to_string()))
    }
}

struct Fixture {
    entities: Vec<StaticEntity>,
    broken: Option<Broken>,
}

impl EntityProvider for Fixture {
    fn list_entities(&self) -> Result<Vec<&dyn Entity>, ProviderError> {
        let mut all: Vec<&dyn Entity> = self.entities.iter().map(|e| e as &dyn Entity).collect();
        if let Some(broken) = &self.broken {
            all.push(broken);
        }
        Ok(all)
    }
}

fn blog() -> Fixture {
    Fixture {
        entities: vec![
            entity(
                "User",
                "users",
                vec![raw("id", "integer", false), raw("name", "string", true)],
                vec![reflection(AssociationType::HasMany, "posts", "Post", "user_id")],
            ),
            entity(
                "Post",
                "posts",
                vec![
                    raw("id", "integer", false),
                    raw("title", "string", true),
                    raw("user_id", "integer", false),
                ],
                vec![reflection(AssociationType::BelongsTo, "user", "User", "user_id")],
            ),
        ],
        broken: None,
    }
}

fn build(provider: &dyn EntityProvider, exclude: Vec<String>, schema: Option<&SchemaMap>) -> schema_diagram::graph::GraphDocument {
    let entities = ModelScanner::new(exclude).scan(provider, schema);
    GraphBuilder::new(schema).build_at(&entities, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
}

#[test]
fn test_user_post_graph() {
    let doc = build(&blog(), Vec::new(), None);

    let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["Post", "User"]);

    let post = doc.node("Post").unwrap();
    assert_eq!(post.table_name, "posts");
    assert!(post.columns[0].primary);
    assert!(!post.columns[2].primary);
    assert!(!post.columns[2].nullable);

    assert_eq!(doc.edges.len(), 2);
    let belongs = &doc.edges[0];
    assert_eq!((belongs.from.as_str(), belongs.to.as_str()), ("Post", "User"));
    assert_eq!(belongs.association_type, AssociationType::BelongsTo);
    assert_eq!(belongs.foreign_key.as_deref(), Some("user_id"));
    let has_many = &doc.edges[1];
    assert_eq!(has_many.association_type, AssociationType::HasMany);
    assert_eq!(has_many.label, "posts");

    assert_eq!(doc.metadata.model_count, 2);
    assert_eq!(doc.metadata.generated_at, "2026-01-01T00:00:00Z");
}

#[test]
fn test_excluded_target_drops_edges() {
    let doc = build(&blog(), vec!["User".to_string()], None);
    assert_eq!(doc.nodes.len(), 1);
    assert!(doc.edges.is_empty());
}

#[test]
fn test_no_dangling_edges() {
    let mut fixture = blog();
    fixture.entities[0]
        .associations
        .push(reflection(AssociationType::HasOne, "profile", "Profile", "user_id"));
    let doc = build(&fixture, Vec::new(), None);

    for edge in &doc.edges {
        assert!(doc.node(&edge.from).is_some());
        assert!(doc.node(&edge.to).is_some());
    }
    assert!(!doc.edges.iter().any(|e| e.label == "profile"));
}

#[test]
fn test_build_is_idempotent() {
    let first = build(&blog(), Vec::new(), None);
    let second = build(&blog(), Vec::new(), None);
    assert_eq!(first, second);
}

#[test]
fn test_failing_entity_is_isolated() {
    let mut fixture = blog();
    fixture.broken = Some(Broken);
    let doc = build(&fixture, Vec::new(), None);

    assert_eq!(doc.nodes.len(), 3);
    assert!(doc.node("Broken").unwrap().columns.is_empty());
    assert_eq!(doc.node("User").unwrap().columns.len(), 2);
    assert_eq!(doc.edges.len(), 2);
}

#[test]
fn test_schema_is_authoritative() {
    let schema = ColumnarSchemaParser::parse_content(
        r#"
  create_table "users" do |t|
    t.string "email", null: false
    t.string "name"
    t.string "locale"
  end
"#,
    );
    let doc = build(&blog(), Vec::new(), Some(&schema));

    // posts has no table in the schema
    let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["User"]);
    let columns: Vec<_> = doc.nodes[0].columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "email", "name", "locale"]);
    assert!(doc.edges.is_empty());
}

#[test]
fn test_manifest_provider_graph() {
    let provider = ManifestProvider::from_yaml(
        r#"
version: "7.1.3"
models:
  - name: ApplicationRecord
    abstract: true
  - name: Comment
    columns:
      - { name: id, type: integer, null: false }
      - { name: commentable_id, type: integer }
      - { name: commentable_type, type: string }
    associations:
      - { macro: belongs_to, name: commentable, options: { polymorphic: true } }
  - name: Article
    columns:
      - { name: id, type: integer, null: false }
    associations:
      - { macro: has_many, name: comments, options: { as: commentable } }
      - { macro: has_many, name: commenters, target: User, options: { through: comments } }
  - name: User
    columns:
      - { name: id, type: integer, null: false }
"#,
    )
    .unwrap();

    let entities = ModelScanner::new(Vec::new()).scan(&provider, None);
    let doc = GraphBuilder::new(None)
        .with_source_version(provider.source_version())
        .build(&entities);

    let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["Article", "Comment", "User"]);
    assert_eq!(doc.metadata.source_version.as_deref(), Some("7.1.3"));

    // the polymorphic belongs_to is skipped; the inverse side is flagged
    assert_eq!(doc.edges.len(), 2);
    let comments = doc.edges.iter().find(|e| e.label == "comments").unwrap();
    assert!(comments.polymorphic);
    assert_eq!(comments.foreign_key.as_deref(), Some("commentable_id"));
    let commenters = doc.edges.iter().find(|e| e.label == "commenters").unwrap();
    assert_eq!(commenters.through.as_deref(), Some("comments"));
    assert_eq!(commenters.to, "User");
}

#[test]
fn test_node_ids_unique_for_colliding_tables() {
    let schema = ColumnarSchemaParser::parse_content(
        r#"
  create_table "user" do |t|
    t.string "login"
  end

  create_table "users" do |t|
    t.string "email"
  end

  create_table "posts" do |t|
    t.bigint "user_id"
  end
"#,
    );
    let provider = SchemaProvider::new(&schema);
    let doc = build(&provider, Vec::new(), Some(&schema));

    let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["Post", "User"]);
    assert_eq!(doc.node("User").unwrap().table_name, "user");
    assert!(doc
        .edges
        .iter()
        .all(|e| doc.node(&e.from).is_some() && doc.node(&e.to).is_some()));
}
