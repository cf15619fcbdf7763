//! Interaction state: selection, visibility, search and the view transform.

use super::geometry::{BoundingBox, Point};
use super::layout::{FIT_MARGIN, FIT_MAX_SCALE, MAX_ZOOM, MIN_ZOOM};
use crate::graph::{Edge, GraphDocument};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;

/// Size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Uniform scale followed by a translation, applied to the whole scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    /// Scene point to screen point
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    /// Screen point to scene point
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    /// Multiply the scale, keeping the viewport centre fixed. The scale is
    /// clamped to the zoom extent.
    pub fn scale_by(&self, factor: f64, viewport: Viewport) -> Self {
        let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let screen = viewport.center();
        let scene = self.invert(screen);
        Self {
            k,
            x: screen.x - scene.x * k,
            y: screen.y - scene.y * k,
        }
    }

    /// Transform framing `bounds` in the viewport with a margin.
    ///
    /// Never zooms in past the fit maximum. Returns `None` for an empty box.
    pub fn fit(bounds: BoundingBox, viewport: Viewport) -> Option<Self> {
        let (w, h) = (bounds.width(), bounds.height());
        if !(w > 0.0 && h > 0.0) {
            return None;
        }
        let scale = (FIT_MARGIN / (w / viewport.width).max(h / viewport.height))
            .min(FIT_MAX_SCALE)
            .max(MIN_ZOOM);
        let mid = bounds.center();
        Some(Self {
            k: scale,
            x: viewport.width / 2.0 - scale * mid.x,
            y: viewport.height / 2.0 - scale * mid.y,
        })
    }

    /// Zoom level as shown in the toolbar
    pub fn percent(&self) -> i64 {
        (self.k * 100.0).round() as i64
    }
}

/// Mutable view over an immutable document
#[derive(Debug, Clone)]
pub struct ViewState {
    adjacency: AHashMap<String, AHashSet<String>>,
    known: AHashSet<String>,
    selected: Option<String>,
    visible: AHashSet<String>,
    search: String,
    pub transform: ZoomTransform,
}

impl ViewState {
    /// Every node visible, nothing selected
    pub fn new(doc: &GraphDocument) -> Self {
        let mut adjacency: AHashMap<String, AHashSet<String>> = doc
            .nodes
            .iter()
            .map(|n| (n.id.clone(), AHashSet::new()))
            .collect();
        for edge in &doc.edges {
            if let Some(set) = adjacency.get_mut(&edge.from) {
                set.insert(edge.to.clone());
            }
            if let Some(set) = adjacency.get_mut(&edge.to) {
                set.insert(edge.from.clone());
            }
        }
        let known: AHashSet<String> = doc.nodes.iter().map(|n| n.id.clone()).collect();

        Self {
            adjacency,
            visible: known.clone(),
            known,
            selected: None,
            search: String::new(),
            transform: ZoomTransform::IDENTITY,
        }
    }

    /// Select a node, replacing any previous selection. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.known.contains(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    /// Clear the selection; returns whether something was selected
    pub fn deselect(&mut self) -> bool {
        self.selected.take().is_some()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Ids one hop away from `id`
    pub fn neighbors(&self, id: &str) -> Option<&AHashSet<String>> {
        self.adjacency.get(id)
    }

    /// Whether a node is de-emphasised by the current selection
    pub fn is_node_faded(&self, id: &str) -> bool {
        match &self.selected {
            Some(sel) => {
                sel != id
                    && !self
                        .adjacency
                        .get(sel.as_str())
                        .is_some_and(|n| n.contains(id))
            }
            None => false,
        }
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Whether an edge is de-emphasised by the current selection
    pub fn is_edge_faded(&self, edge: &Edge) -> bool {
        match &self.selected {
            Some(sel) => !edge.touches(sel),
            None => false,
        }
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    /// Flip a node's visibility; returns the new state, `None` for unknown ids
    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        if !self.known.contains(id) {
            return None;
        }
        if self.visible.remove(id) {
            Some(false)
        } else {
            self.visible.insert(id.to_string());
            Some(true)
        }
    }

    pub fn show_all(&mut self) {
        self.visible = self.known.clone();
    }

    pub fn hide_all(&mut self) {
        self.visible.clear();
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Whether a node passes the sidebar filter: case-insensitive substring of
    /// its id or table name
    pub fn matches_search(&self, id: &str, table_name: &str) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let query = self.search.to_lowercase();
        id.to_lowercase().contains(&query) || table_name.to_lowercase().contains(&query)
    }
}
