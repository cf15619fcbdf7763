//! Interactive diagram engine.
//!
//! The engine is split the way the browser script is:
//! - [`Simulation`]: the layout step function, no drawing involved
//! - [`Renderer::draw`]: turns current positions into a [`Scene`]
//! - [`Renderer::dispatch`]: turns input events into view-state changes and
//!   reports the [`Effect`]s the host has to apply
//!
//! Everything runs on one thread; events are applied between simulation steps
//! in arrival order.

pub mod geometry;
pub mod layout;
pub mod scene;
pub mod simulation;
pub mod view;

pub use geometry::{parallel_offsets, route_edge, BoundingBox, NodeView, Point};
pub use layout::{LayoutConstants, NodeMetrics};
pub use scene::{DetailPanel, EdgeShape, NodeShape, Scene, SidebarItem};
pub use simulation::{SimNode, Simulation};
pub use view::{ViewState, Viewport, ZoomTransform};

use crate::graph::GraphDocument;
use ahash::AHashMap;
use layout::{INITIAL_FIT_DELAY_MS, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};

/// Raw input, as delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NodeClick(String),
    BackgroundClick,
    DragStart(String),
    DragMove { id: String, position: Point },
    DragEnd(String),
    ToggleVisibility(String),
    ShowAll,
    HideAll,
    Search(String),
    ZoomIn,
    ZoomOut,
    Fit,
    /// A key press; `in_input` is set while a text field has focus
    Key { key: String, in_input: bool },
    Resize(Viewport),
}

/// Work the host has to do after an event or tick
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Positions or emphasis changed
    Redraw,
    /// The visible set changed and the layout started over
    LayoutRestarted,
    SidebarChanged,
    ShowDetail(String),
    HideDetail,
    FocusSearch,
    BlurInput,
    Transform(ZoomTransform),
}

/// Position, velocity and pin of a node carried across layout restarts
#[derive(Debug, Clone, Copy)]
struct Placement {
    position: Point,
    velocity: Point,
    pin: (Option<f64>, Option<f64>),
}

/// Headless renderer over one graph document
#[derive(Debug, Clone)]
pub struct Renderer {
    doc: GraphDocument,
    metrics: Vec<NodeMetrics>,
    node_index: AHashMap<String, usize>,
    view: ViewState,
    viewport: Viewport,
    simulation: Simulation,
    /// Last known state of every node that has been laid out
    placements: AHashMap<String, Placement>,
    /// Document edge indices currently in the layout, with their parallel offsets
    active_edges: Vec<(usize, f64)>,
    fitted: bool,
}

impl Renderer {
    pub fn new(doc: GraphDocument, expand_columns: bool, viewport: Viewport) -> Self {
        let metrics = doc
            .nodes
            .iter()
            .map(|n| NodeMetrics::measure(n, expand_columns))
            .collect();
        let node_index = doc
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let view = ViewState::new(&doc);

        let mut renderer = Self {
            doc,
            metrics,
            node_index,
            view,
            viewport,
            simulation: Simulation::new(Vec::new(), &[], viewport.center()),
            placements: AHashMap::new(),
            active_edges: Vec::new(),
            fitted: false,
        };
        renderer.rebuild();
        renderer
    }

    pub fn document(&self) -> &GraphDocument {
        &self.doc
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn metrics(&self, id: &str) -> Option<&NodeMetrics> {
        self.node_index.get(id).map(|&i| &self.metrics[i])
    }

    /// Current position of a laid-out node
    pub fn position(&self, id: &str) -> Option<Point> {
        self.simulation.node(id).map(SimNode::position)
    }

    /// Restart the layout over the visible nodes, keeping known positions
    fn rebuild(&mut self) {
        for node in self.simulation.nodes() {
            self.placements.insert(
                node.id.clone(),
                Placement {
                    position: node.position(),
                    velocity: Point::new(node.vx, node.vy),
                    pin: (node.fx, node.fy),
                },
            );
        }

        let mut sim_index: AHashMap<&str, usize> = AHashMap::new();
        let mut nodes = Vec::new();
        for (i, node) in self.doc.nodes.iter().enumerate() {
            if !self.view.is_visible(&node.id) {
                continue;
            }
            let radius = self.metrics[i].collide_radius();
            let sim_node = match self.placements.get(&node.id) {
                Some(placement) => {
                    let mut sim_node =
                        SimNode::at(&node.id, radius, placement.position, placement.velocity);
                    (sim_node.fx, sim_node.fy) = placement.pin;
                    sim_node
                }
                None => SimNode::new(&node.id, radius),
            };
            sim_index.insert(node.id.as_str(), nodes.len());
            nodes.push(sim_node);
        }

        let mut links = Vec::new();
        let mut active = Vec::new();
        for (i, edge) in self.doc.edges.iter().enumerate() {
            if let (Some(&s), Some(&t)) = (
                sim_index.get(edge.from.as_str()),
                sim_index.get(edge.to.as_str()),
            ) {
                links.push((s, t));
                active.push(i);
            }
        }

        let edges: Vec<_> = active.iter().map(|&i| &self.doc.edges[i]).collect();
        let offsets = parallel_offsets(&edges);
        self.active_edges = active.into_iter().zip(offsets).collect();
        self.simulation = Simulation::new(nodes, &links, self.viewport.center());
    }

    /// Apply one input event
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::NodeClick(id) => self.select(&id),
            Event::BackgroundClick => self.deselect(),
            Event::DragStart(id) => redraw_if(self.simulation.drag_start(&id)),
            Event::DragMove { id, position } => redraw_if(self.simulation.drag_to(&id, position)),
            Event::DragEnd(id) => {
                self.simulation.drag_end(&id);
                Vec::new()
            }
            Event::ToggleVisibility(id) => match self.view.toggle_visibility(&id) {
                Some(_) => {
                    let mut effects = self.drop_hidden_selection();
                    self.rebuild();
                    effects.extend([Effect::LayoutRestarted, Effect::Redraw]);
                    effects
                }
                None => Vec::new(),
            },
            Event::ShowAll => {
                self.view.show_all();
                self.rebuild();
                vec![Effect::SidebarChanged, Effect::LayoutRestarted, Effect::Redraw]
            }
            Event::HideAll => {
                self.view.hide_all();
                let mut effects = self.drop_hidden_selection();
                self.rebuild();
                effects.extend([Effect::SidebarChanged, Effect::LayoutRestarted, Effect::Redraw]);
                effects
            }
            Event::Search(query) => {
                self.view.set_search(query);
                vec![Effect::SidebarChanged]
            }
            Event::ZoomIn => self.zoom(ZOOM_IN_FACTOR),
            Event::ZoomOut => self.zoom(ZOOM_OUT_FACTOR),
            Event::Fit => self.fit(),
            Event::Key { key, in_input } => self.key(&key, in_input),
            Event::Resize(viewport) => {
                self.viewport = viewport;
                Vec::new()
            }
        }
    }

    /// Advance the layout by one step. The first call at or after the initial
    /// fit delay also frames the diagram.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.simulation.step() {
            effects.push(Effect::Redraw);
        }
        if !self.fitted && now_ms >= INITIAL_FIT_DELAY_MS {
            self.fitted = true;
            effects.extend(self.fit());
        }
        effects
    }

    fn select(&mut self, id: &str) -> Vec<Effect> {
        if !self.view.select(id) {
            return Vec::new();
        }
        vec![
            Effect::Redraw,
            Effect::ShowDetail(id.to_string()),
            Effect::SidebarChanged,
        ]
    }

    fn deselect(&mut self) -> Vec<Effect> {
        self.view.deselect();
        vec![Effect::Redraw, Effect::HideDetail, Effect::SidebarChanged]
    }

    /// Clear the selection when its node is no longer visible
    fn drop_hidden_selection(&mut self) -> Vec<Effect> {
        let hidden = self
            .view
            .selected()
            .is_some_and(|id| !self.view.is_visible(id));
        if !hidden {
            return Vec::new();
        }
        self.view.deselect();
        vec![Effect::HideDetail, Effect::SidebarChanged]
    }

        fn zoom(&mut self, factor: f64) -> Vec<Effect> {
        self.view.transform = self.view.transform.scale_by(factor, self.viewport);
        vec![Effect::Transform(self.view.transform)]
    }

    fn fit(&mut self) -> Vec<Effect> {
        match self
            .bounds()
            .and_then(|b| ZoomTransform::fit(b, self.viewport))
        {
            Some(transform) => {
                self.view.transform = transform;
                vec![Effect::Transform(transform)]
            }
            None => Vec::new(),
        }
    }

    fn key(&mut self, key: &str, in_input: bool) -> Vec<Effect> {
        if in_input {
            if key != "Escape" {
                return Vec::new();
            }
            let mut effects = vec![Effect::BlurInput];
            effects.extend(self.deselect());
            return effects;
        }

        match key {
            "/" => vec![Effect::FocusSearch],
            "Escape" => self.deselect(),
            "+" | "=" => self.zoom(ZOOM_IN_FACTOR),
            "-" => self.zoom(ZOOM_OUT_FACTOR),
            "f" | "F" => self.fit(),
            _ => Vec::new(),
        }
    }

    fn node_view(&self, id: &str) -> Option<NodeView<'_>> {
        let metrics = self.metrics(id)?;
        let center = self.position(id)?;
        Some(NodeView { center, metrics })
    }

    /// The current frame
    pub fn draw(&self) -> Scene {
        let nodes = self
            .simulation
            .nodes()
            .iter()
            .filter_map(|sim| {
                let i = *self.node_index.get(&sim.id)?;
                let mut shape = NodeShape::new(&self.doc.nodes[i], &self.metrics[i], sim.position());
                shape.faded = self.view.is_node_faded(&sim.id);
                shape.highlighted = self.view.is_highlighted(&sim.id);
                Some(shape)
            })
            .collect();

        let edges = self
            .active_edges
            .iter()
            .filter_map(|&(i, offset)| {
                let edge = &self.doc.edges[i];
                let source = self.node_view(&edge.from)?;
                let target = self.node_view(&edge.to)?;
                let route = route_edge(source, target, edge, offset);
                let mut shape = EdgeShape::new(edge, &route);
                shape.faded = self.view.is_edge_faded(edge);
                Some(shape)
            })
            .collect();

        Scene {
            transform: self.view.transform,
            nodes,
            edges,
        }
    }

    /// Bounds of everything drawn, `None` when nothing is visible
    pub fn bounds(&self) -> Option<BoundingBox> {
        let node_boxes = self
            .simulation
            .nodes()
            .iter()
            .filter_map(|sim| self.node_view(&sim.id))
            .map(BoundingBox::of_node);

        let edge_boxes = self.active_edges.iter().filter_map(|&(i, offset)| {
            let edge = &self.doc.edges[i];
            let source = self.node_view(&edge.from)?;
            let target = self.node_view(&edge.to)?;
            Some(route_edge(source, target, edge, offset).path.bounds())
        });

        node_boxes.chain(edge_boxes).reduce(BoundingBox::union)
    }

    /// Model list entries matching the search query, in document order
    pub fn sidebar_items(&self) -> Vec<SidebarItem> {
        let selected = self.view.selected();
        self.doc
            .nodes
            .iter()
            .filter(|n| self.view.matches_search(&n.id, &n.table_name))
            .map(|n| SidebarItem {
                id: n.id.clone(),
                edge_count: self.doc.incident_edges(&n.id).count(),
                visible: self.view.is_visible(&n.id),
                active: selected == Some(n.id.as_str()),
            })
            .collect()
    }

    /// Detail panel for the selected node
    pub fn detail_panel(&self) -> Option<DetailPanel> {
        let node = self.doc.node(self.view.selected()?)?;
        Some(DetailPanel::new(node, &self.doc.edges))
    }
}

fn redraw_if(changed: bool) -> Vec<Effect> {
    if changed {
        vec![Effect::Redraw]
    } else {
        Vec::new()
    }
}
