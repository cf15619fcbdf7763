//! Self-contained interactive HTML artifact.
//!
//! The document, the render configuration and the layout constants are
//! inlined as script globals next to the stylesheet and the application
//! script, so the file works offline with nothing else beside it.

use crate::config::Config;
use crate::graph::GraphDocument;
use crate::render::LayoutConstants;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const STYLE_CSS: &str = include_str!("../../../assets/style.css");
const APP_JS: &str = include_str!("../../../assets/app.js");

/// Configuration object read by the application script
#[derive(Debug, Serialize)]
struct ClientConfig<'a> {
    expand_columns: bool,
    /// `light`, `dark`, or empty to follow the system preference
    theme: &'a str,
}

/// Renders a graph document into the interactive diagram page
pub struct HtmlGenerator<'a> {
    doc: &'a GraphDocument,
    config: &'a Config,
}

impl<'a> HtmlGenerator<'a> {
    pub fn new(doc: &'a GraphDocument, config: &'a Config) -> Self {
        Self { doc, config }
    }

    /// The complete page
    pub fn render(&self) -> String {
        let theme = self.config.theme.css_class();
        let client_config = ClientConfig {
            expand_columns: self.config.expand_columns,
            theme,
        };

        let data = escape_script_json(&to_json(self.doc));
        let config = escape_script_json(&to_json(&client_config));
        let layout = escape_script_json(&to_json(&LayoutConstants::default()));
        let title = escape_html(&self.config.title);
        let stats = format!(
            "{} models · {} associations",
            self.doc.nodes.len(),
            self.doc.edges.len()
        );

        format!(
            r##"<!DOCTYPE html>
<html lang="en" class="{theme}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
{STYLE_CSS}
  </style>
</head>
<body>
  <aside id="sidebar">
    <div class="sidebar-header">
      <h1>{title}</h1>
      <div class="stats">{stats}</div>
      <input id="search-input" type="search" placeholder="Search models... ( / )" autocomplete="off">
      <div class="sidebar-actions">
        <button id="select-all-btn" class="btn">Show all</button>
        <button id="deselect-all-btn" class="btn">Hide all</button>
      </div>
    </div>
    <div id="model-list"></div>
  </aside>
  <main id="canvas">
    <div id="toolbar">
      <button id="zoom-in-btn" class="btn" title="Zoom in (+)">+</button>
      <button id="zoom-out-btn" class="btn" title="Zoom out (-)">&minus;</button>
      <button id="fit-btn" class="btn" title="Fit to screen (F)">Fit</button>
      <span id="zoom-info">100%</span>
      <button id="theme-btn" class="btn" title="Toggle theme">&#9680;</button>
    </div>
    <svg id="schema-svg" xmlns="http://www.w3.org/2000/svg"></svg>
  </main>
  <aside id="detail-panel">
    <div id="detail-content"></div>
  </aside>
  <script>
    window.__SCHEMA_DATA__ = {data};
    window.__SCHEMA_CONFIG__ = {config};
    window.__SCHEMA_LAYOUT__ = {layout};
  </script>
  <script>
{APP_JS}
  </script>
</body>
</html>
"##
        )
    }

    /// Write the page, creating parent directories. Defaults to the
    /// configured output path.
    pub fn render_to_file(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = path.unwrap_or(&self.config.output_path).to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create directory {}", parent.display()))?;
        }
        fs::write(&path, self.render())
            .with_context(|| format!("could not write {}", path.display()))?;
        Ok(path)
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Make JSON safe to embed in a `<script>` element
pub fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Escape text for HTML content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
