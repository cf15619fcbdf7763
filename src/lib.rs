pub mod config;
pub mod extractor;
pub mod generator;
pub mod graph;
pub mod inflect;
pub mod json_schema;
pub mod provider;
pub mod render;
pub mod schema;
