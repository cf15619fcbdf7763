//! Drawable output of the renderer: what the host turns into SVG and DOM.

use super::geometry::{EdgeRoute, Point};
use super::layout::NodeMetrics;
use super::view::ZoomTransform;
use crate::graph::{AssociationType, Edge, Node};
use serde::Serialize;

/// Cardinality symbol drawn at an edge end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// Perpendicular bar
    One,
    /// Crow's foot
    Many,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::One => "one",
            MarkerKind::Many => "many",
        }
    }
}

/// Markers at the (start, end) of an edge of the given type
pub fn markers(association_type: AssociationType) -> (MarkerKind, MarkerKind) {
    match association_type {
        AssociationType::BelongsTo => (MarkerKind::Many, MarkerKind::One),
        AssociationType::HasMany => (MarkerKind::One, MarkerKind::Many),
        AssociationType::HasOne => (MarkerKind::One, MarkerKind::One),
        AssociationType::HasAndBelongsToMany => (MarkerKind::Many, MarkerKind::Many),
    }
}

/// SVG marker id, e.g. `marker-many-belongs_to`
pub fn marker_id(kind: MarkerKind, association_type: AssociationType) -> String {
    format!("marker-{}-{}", kind.as_str(), association_type)
}

/// CSS classes of an edge path
pub fn edge_class(edge: &Edge) -> String {
    let mut class = format!("edge-line {}", edge.association_type);
    if edge.through.is_some() {
        class.push_str(" through");
    }
    if edge.polymorphic {
        class.push_str(" polymorphic-edge");
    }
    class
}

/// One column row inside a node box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowShape {
    /// Column name, prefixed with `PK ` for primary keys
    pub label: String,
    pub col_type: String,
    pub primary: bool,
    /// Offset from the node centre
    pub y: f64,
}

/// A node box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeShape {
    pub id: String,
    pub table_name: String,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub rows: Vec<RowShape>,
    /// `+N more` text and its offset
    pub more: Option<(String, f64)>,
    pub faded: bool,
    pub highlighted: bool,
}

impl NodeShape {
    pub fn new(node: &Node, metrics: &NodeMetrics, center: Point) -> Self {
        let rows = node
            .columns
            .iter()
            .zip(&metrics.row_offsets)
            .map(|(col, y)| RowShape {
                label: if col.primary {
                    format!("PK {}", col.name)
                } else {
                    col.name.clone()
                },
                col_type: col.col_type.clone(),
                primary: col.primary,
                y: *y,
            })
            .collect();

        let more = metrics
            .more_row_offset
            .map(|y| (format!("+{} more", metrics.hidden_columns), y));

        Self {
            id: node.id.clone(),
            table_name: node.table_name.clone(),
            center,
            width: metrics.width(),
            height: metrics.height,
            rows,
            more,
            faded: false,
            highlighted: false,
        }
    }
}

/// A drawn edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeShape {
    pub from: String,
    pub to: String,
    pub label: String,
    /// SVG path data
    pub path: String,
    pub label_position: Point,
    pub class: String,
    pub marker_start: String,
    pub marker_end: String,
    pub faded: bool,
}

impl EdgeShape {
    pub fn new(edge: &Edge, route: &EdgeRoute) -> Self {
        let (start, end) = markers(edge.association_type);
        Self {
            from: edge.from.clone(),
            to: edge.to.clone(),
            label: edge.label.clone(),
            path: route.path.to_string(),
            label_position: route.label,
            class: edge_class(edge),
            marker_start: marker_id(start, edge.association_type),
            marker_end: marker_id(end, edge.association_type),
            faded: false,
        }
    }
}

/// Everything visible in one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub transform: ZoomTransform,
    pub nodes: Vec<NodeShape>,
    pub edges: Vec<EdgeShape>,
}

/// One entry in the model list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarItem {
    pub id: String,
    /// Edges in the document touching this node
    pub edge_count: usize,
    pub visible: bool,
    pub active: bool,
}

/// A column in the detail panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailColumn {
    pub label: String,
    /// Type, with ` NOT NULL` appended for required columns
    pub col_type: String,
    pub primary: bool,
}

/// An association in the detail panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailAssociation {
    pub association_type: AssociationType,
    pub label: String,
    /// The entity at the other end
    pub target: String,
    pub through: Option<String>,
}

/// Details of the selected node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailPanel {
    pub id: String,
    pub table_name: String,
    pub columns: Vec<DetailColumn>,
    pub associations: Vec<DetailAssociation>,
}

impl DetailPanel {
    pub fn new<'a>(node: &Node, edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let columns = node
            .columns
            .iter()
            .map(|col| DetailColumn {
                label: if col.primary {
                    format!("PK {}", col.name)
                } else {
                    col.name.clone()
                },
                col_type: if col.nullable {
                    col.col_type.clone()
                } else {
                    format!("{} NOT NULL", col.col_type)
                },
                primary: col.primary,
            })
            .collect();

        let associations = edges
            .into_iter()
            .filter(|e| e.touches(&node.id))
            .map(|e| DetailAssociation {
                association_type: e.association_type,
                label: e.label.clone(),
                target: e.other_end(&node.id).to_string(),
                through: e.through.clone(),
            })
            .collect();

        Self {
            id: node.id.clone(),
            table_name: node.table_name.clone(),
            columns,
            associations,
        }
    }
}
