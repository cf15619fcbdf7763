//! Geometry and physics constants shared by the headless engine and the
//! browser script, plus per-node measurements.

use crate::graph::Node;
use ahash::AHashMap;
use serde::Serialize;

pub const NODE_WIDTH: f64 = 180.0;
pub const NODE_HEADER_HEIGHT: f64 = 36.0;
pub const NODE_COLUMN_HEIGHT: f64 = 18.0;
pub const NODE_PADDING: f64 = 8.0;
/// Columns shown before the "+N more" row when columns are collapsed
pub const COLLAPSED_COLUMN_LIMIT: usize = 4;
/// Baseline offset of a row's text inside its row
pub const ROW_TEXT_OFFSET: f64 = 10.0;

pub const LINK_DISTANCE: f64 = 320.0;
pub const CHARGE_STRENGTH: f64 = -600.0;
pub const COLLIDE_PADDING: f64 = 50.0;
pub const VELOCITY_DECAY: f64 = 0.4;
pub const ALPHA_MIN: f64 = 0.001;
/// Ticks for alpha to fall from 1 to [`ALPHA_MIN`]
pub const ALPHA_TICKS: f64 = 300.0;
pub const DRAG_ALPHA_TARGET: f64 = 0.3;

pub const MIN_LOOP_OFFSET: f64 = 60.0;
pub const LOOP_OFFSET_RATIO: f64 = 0.5;
pub const MIN_CURVE_OFFSET: f64 = 50.0;
pub const CURVE_OFFSET_RATIO: f64 = 0.4;
pub const SELF_LOOP_OFFSET: f64 = 60.0;
pub const SELF_LOOP_SPREAD: f64 = 20.0;
pub const PARALLEL_EDGE_SPACING: f64 = 8.0;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 4.0;
pub const ZOOM_IN_FACTOR: f64 = 1.3;
pub const ZOOM_OUT_FACTOR: f64 = 0.7;
pub const FIT_MARGIN: f64 = 0.9;
pub const FIT_MAX_SCALE: f64 = 2.0;
pub const INITIAL_FIT_DELAY_MS: u64 = 1500;

/// Per-tick alpha decay reaching [`ALPHA_MIN`] after [`ALPHA_TICKS`] ticks
pub fn alpha_decay() -> f64 {
    1.0 - ALPHA_MIN.powf(1.0 / ALPHA_TICKS)
}

/// The constants as embedded into the artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutConstants {
    pub node_width: f64,
    pub node_header_height: f64,
    pub node_column_height: f64,
    pub node_padding: f64,
    pub collapsed_column_limit: usize,
    pub row_text_offset: f64,
    pub link_distance: f64,
    pub charge_strength: f64,
    pub collide_padding: f64,
    pub velocity_decay: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub drag_alpha_target: f64,
    pub min_loop_offset: f64,
    pub loop_offset_ratio: f64,
    pub min_curve_offset: f64,
    pub curve_offset_ratio: f64,
    pub self_loop_offset: f64,
    pub self_loop_spread: f64,
    pub parallel_edge_spacing: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    pub fit_margin: f64,
    pub fit_max_scale: f64,
    pub initial_fit_delay_ms: u64,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_header_height: NODE_HEADER_HEIGHT,
            node_column_height: NODE_COLUMN_HEIGHT,
            node_padding: NODE_PADDING,
            collapsed_column_limit: COLLAPSED_COLUMN_LIMIT,
            row_text_offset: ROW_TEXT_OFFSET,
            link_distance: LINK_DISTANCE,
            charge_strength: CHARGE_STRENGTH,
            collide_padding: COLLIDE_PADDING,
            velocity_decay: VELOCITY_DECAY,
            alpha_min: ALPHA_MIN,
            alpha_decay: alpha_decay(),
            drag_alpha_target: DRAG_ALPHA_TARGET,
            min_loop_offset: MIN_LOOP_OFFSET,
            loop_offset_ratio: LOOP_OFFSET_RATIO,
            min_curve_offset: MIN_CURVE_OFFSET,
            curve_offset_ratio: CURVE_OFFSET_RATIO,
            self_loop_offset: SELF_LOOP_OFFSET,
            self_loop_spread: SELF_LOOP_SPREAD,
            parallel_edge_spacing: PARALLEL_EDGE_SPACING,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_in_factor: ZOOM_IN_FACTOR,
            zoom_out_factor: ZOOM_OUT_FACTOR,
            fit_margin: FIT_MARGIN,
            fit_max_scale: FIT_MAX_SCALE,
            initial_fit_delay_ms: INITIAL_FIT_DELAY_MS,
        }
    }
}

/// Rendered footprint of one node. Offsets are relative to the node centre.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetrics {
    pub height: f64,
    /// Number of column rows drawn
    pub visible_columns: usize,
    /// Columns summarised by the "+N more" row
    pub hidden_columns: usize,
    /// Vertical offset of each drawn row, in column order
    pub row_offsets: Vec<f64>,
    /// Vertical offset of the "+N more" row
    pub more_row_offset: Option<f64>,
    column_offsets: AHashMap<String, f64>,
    primary_offset: Option<f64>,
}

impl NodeMetrics {
    /// Measure a node with all columns (`expand`) or the collapsed view
    pub fn measure(node: &Node, expand: bool) -> Self {
        let total = node.columns.len();
        let visible = if expand {
            total
        } else {
            total.min(COLLAPSED_COLUMN_LIMIT)
        };
        let hidden = total - visible;

        let mut height =
            NODE_HEADER_HEIGHT + visible as f64 * NODE_COLUMN_HEIGHT + NODE_PADDING * 2.0;
        if hidden > 0 {
            height += NODE_COLUMN_HEIGHT;
        }

        let start = -height / 2.0 + NODE_HEADER_HEIGHT + NODE_PADDING;
        let row_offsets: Vec<f64> = (0..visible)
            .map(|i| start + i as f64 * NODE_COLUMN_HEIGHT + ROW_TEXT_OFFSET)
            .collect();

        let mut column_offsets = AHashMap::with_capacity(visible);
        for (col, offset) in node.columns.iter().zip(&row_offsets) {
            column_offsets.insert(col.name.clone(), *offset);
        }
        let primary_offset = node
            .columns
            .iter()
            .zip(&row_offsets)
            .find(|(col, _)| col.primary)
            .and_then(|(col, _)| column_offsets.get(&col.name).copied());

        let more_row_offset = (hidden > 0)
            .then(|| start + visible as f64 * NODE_COLUMN_HEIGHT + ROW_TEXT_OFFSET);

        Self {
            height,
            visible_columns: visible,
            hidden_columns: hidden,
            row_offsets,
            more_row_offset,
            column_offsets,
            primary_offset,
        }
    }

    pub fn width(&self) -> f64 {
        NODE_WIDTH
    }

    /// Anchor offset for a named column: its row, else the "+N more" row, else the centre
    pub fn column_y(&self, name: Option<&str>) -> f64 {
        name.and_then(|n| self.column_offsets.get(n).copied())
            .or(self.more_row_offset)
            .unwrap_or(0.0)
    }

    /// Anchor offset of the first drawn primary-key row, with the same fallbacks
    pub fn primary_y(&self) -> f64 {
        self.primary_offset
            .or(self.more_row_offset)
            .unwrap_or(0.0)
    }

    /// Collision radius used by the layout
    pub fn collide_radius(&self) -> f64 {
        NODE_WIDTH.max(self.height) / 2.0 + COLLIDE_PADDING
    }
}
