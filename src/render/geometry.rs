//! Edge routing and scene bounds.

use super::layout::{
    NodeMetrics, CURVE_OFFSET_RATIO, LOOP_OFFSET_RATIO, MIN_CURVE_OFFSET, MIN_LOOP_OFFSET,
    NODE_WIDTH, PARALLEL_EDGE_SPACING, SELF_LOOP_OFFSET, SELF_LOOP_SPREAD,
};
use crate::graph::{AssociationType, Edge};
use ahash::AHashMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A placed node: its centre and measurements
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub center: Point,
    pub metrics: &'a NodeMetrics,
}

/// Endpoints of an edge between two distinct nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPoints {
    pub start: Point,
    pub end: Point,
    /// Both ends leave from the right-hand side
    pub same_side: bool,
}

/// Pick the endpoint on each node.
///
/// Vertical anchors follow where the key lives: `belongs_to` starts at the
/// foreign key row and ends at the target's primary key, `has_many`/`has_one`
/// the other way round, many-to-many joins both primary keys.
pub fn connection_points(
    source: NodeView<'_>,
    target: NodeView<'_>,
    association_type: AssociationType,
    foreign_key: Option<&str>,
) -> ConnectionPoints {
    let (src_y, tgt_y) = match association_type {
        kind if kind.is_owning() => (
            source.metrics.column_y(foreign_key),
            target.metrics.primary_y(),
        ),
        AssociationType::HasAndBelongsToMany => {
            (source.metrics.primary_y(), target.metrics.primary_y())
        }
        _ => (
            source.metrics.primary_y(),
            target.metrics.column_y(foreign_key),
        ),
    };

    let half = NODE_WIDTH / 2.0;
    let dx = target.center.x - source.center.x;
    let (src_x, tgt_x, same_side) = if dx.abs() > NODE_WIDTH {
        if dx > 0.0 {
            (source.center.x + half, target.center.x - half, false)
        } else {
            (source.center.x - half, target.center.x + half, false)
        }
    } else {
        (source.center.x + half, target.center.x + half, true)
    };

    ConnectionPoints {
        start: Point::new(src_x, source.center.y + src_y),
        end: Point::new(tgt_x, target.center.y + tgt_y),
        same_side,
    }
}

/// Cubic Bézier segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicPath {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CubicPath {
    /// Bounds of the control polygon, which contains the curve
    pub fn bounds(&self) -> BoundingBox {
        [self.c1, self.c2, self.end]
            .into_iter()
            .fold(BoundingBox::at(self.start), |b, p| b.include(p))
    }
}

impl fmt::Display for CubicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.end.x,
            self.end.y
        )
    }
}

/// Path and label position of a drawn edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRoute {
    pub path: CubicPath,
    pub label: Point,
}

/// Route an edge between two placed nodes.
///
/// `parallel_offset` shifts both anchors vertically to separate edges that
/// join the same pair of nodes. Self-references ignore it and loop out of the
/// node's right side.
pub fn route_edge(
    source: NodeView<'_>,
    target: NodeView<'_>,
    edge: &Edge,
    parallel_offset: f64,
) -> EdgeRoute {
    if edge.is_self_referential() {
        return self_loop(source.center);
    }

    let conn = connection_points(
        source,
        target,
        edge.association_type,
        edge.foreign_key.as_deref(),
    );
    let (x1, x2) = (conn.start.x, conn.end.x);
    let y1 = conn.start.y + parallel_offset;
    let y2 = conn.end.y + parallel_offset;

    let (c1, c2) = if conn.same_side {
        let offset = MIN_LOOP_OFFSET.max((y2 - y1).abs() * LOOP_OFFSET_RATIO);
        (Point::new(x1 + offset, y1), Point::new(x2 + offset, y2))
    } else {
        let dx = x2 - x1;
        let offset = MIN_CURVE_OFFSET.max(dx.abs() * CURVE_OFFSET_RATIO);
        let dir = if dx < 0.0 { -1.0 } else { 1.0 };
        (
            Point::new(x1 + offset * dir, y1),
            Point::new(x2 - offset * dir, y2),
        )
    };

    // x at t = 0.5 of the cubic, y halfway between the ends
    let label = Point::new(
        0.125 * x1 + 0.375 * c1.x + 0.375 * c2.x + 0.125 * x2,
        (y1 + y2) / 2.0,
    );

    EdgeRoute {
        path: CubicPath {
            start: Point::new(x1, y1),
            c1,
            c2,
            end: Point::new(x2, y2),
        },
        label,
    }
}

fn self_loop(center: Point) -> EdgeRoute {
    let x = center.x + NODE_WIDTH / 2.0;
    let top = center.y - SELF_LOOP_SPREAD;
    let bottom = center.y + SELF_LOOP_SPREAD;
    let out = x + SELF_LOOP_OFFSET;

    EdgeRoute {
        path: CubicPath {
            start: Point::new(x, top),
            c1: Point::new(out, top),
            c2: Point::new(out, bottom),
            end: Point::new(x, bottom),
        },
        label: Point::new(out + 5.0, center.y),
    }
}

/// Lateral offset of each edge, fanning out edges that join the same
/// unordered pair of nodes symmetrically around zero. Lone edges get 0.
pub fn parallel_offsets(edges: &[&Edge]) -> Vec<f64> {
    fn pair_key(edge: &Edge) -> (&str, &str) {
        let (a, b) = (edge.from.as_str(), edge.to.as_str());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    let mut counts: AHashMap<(&str, &str), usize> = AHashMap::new();
    for edge in edges {
        *counts.entry(pair_key(edge)).or_insert(0) += 1;
    }

    let mut seen: AHashMap<(&str, &str), usize> = AHashMap::new();
    edges
        .iter()
        .map(|edge| {
            let key = pair_key(edge);
            let count = counts[&key];
            let index = seen.entry(key).or_insert(0);
            let offset = if count > 1 {
                (*index as f64 - (count as f64 - 1.0) / 2.0) * PARALLEL_EDGE_SPACING
            } else {
                0.0
            };
            *index += 1;
            offset
        })
        .collect()
}

/// Axis-aligned bounds in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Degenerate box around one point
    pub fn at(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Rectangle drawn for a node
    pub fn of_node(node: NodeView<'_>) -> Self {
        let half_w = node.metrics.width() / 2.0;
        let half_h = node.metrics.height / 2.0;
        Self {
            min_x: node.center.x - half_w,
            min_y: node.center.y - half_h,
            max_x: node.center.x + half_w,
            max_y: node.center.y + half_h,
        }
    }

    pub fn include(self, p: Point) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }
}
