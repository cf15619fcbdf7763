//! Generator configuration.
//!
//! A plain value handed to each component; `Config::default()` is the reset
//! state. Values can be loaded from a YAML file where every key is optional:
//!
//! ```yaml
//! output_path: docs/schema.html
//! title: Shop Schema
//! theme: dark
//! expand_columns: true
//! schema_format: auto
//! exclude_models:
//!   - ActiveStorage::*
//!   - Audit
//! ```

use crate::graph::OutputFormat;
use crate::schema::{SchemaFormat, DEFAULT_SCHEMA_PATH, DEFAULT_STRUCTURE_PATH};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File looked up in the working directory when no config is given
pub const CONFIG_FILE_NAME: &str = "schema-diagram.yml";

/// Colour theme of the generated diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the viewer's system preference
    #[default]
    Auto,
    Light,
    Dark,
}

impl Theme {
    /// Class set on the document root; empty for auto
    pub fn css_class(&self) -> &'static str {
        match self {
            Theme::Auto => "",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" | "system" => Ok(Theme::Auto),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!(
                "Unknown theme: {}. Valid options: auto, light, dark",
                s
            )),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Auto => write!(f, "auto"),
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Complete generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the artifact is written
    pub output_path: PathBuf,
    /// Entity names to leave out; a trailing `*` matches by prefix
    pub exclude_models: Vec<String>,
    /// Page title
    pub title: String,
    pub theme: Theme,
    /// Show every column instead of the first few
    pub expand_columns: bool,
    pub schema_format: SchemaFormat,
    /// Declarative schema file
    pub schema_path: PathBuf,
    /// SQL structure dump
    pub structure_path: PathBuf,
    /// Model manifest; when absent entities are derived from the schema
    pub models_path: Option<PathBuf>,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("docs/schema.html"),
            exclude_models: Vec::new(),
            title: "Database Schema".to_string(),
            theme: Theme::Auto,
            expand_columns: false,
            schema_format: SchemaFormat::Auto,
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            structure_path: PathBuf::from(DEFAULT_STRUCTURE_PATH),
            models_path: None,
            format: OutputFormat::Html,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse configuration text; an empty document gives the defaults
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `schema-diagram.yml` from `dir` when it exists
    pub fn discover(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}
