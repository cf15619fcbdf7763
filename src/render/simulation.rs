//! Force-directed layout.
//!
//! Nodes are charged particles joined by springs, pulled to a centre and kept
//! apart by their collision radius. `tick` is a pure position update: the
//! caller decides when to step, so the layout runs the same headless as it
//! does under an animation timer.

use super::geometry::Point;
use super::layout::{
    alpha_decay, ALPHA_MIN, CHARGE_STRENGTH, DRAG_ALPHA_TARGET, LINK_DISTANCE, VELOCITY_DECAY,
};
use std::f64::consts::PI;

const INITIAL_RADIUS: f64 = 10.0;
/// Smallest squared distance used by the charge force
const CHARGE_DISTANCE_MIN2: f64 = 1.0;

/// One particle
#[derive(Debug, Clone, PartialEq)]
pub struct SimNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned position; overrides the simulated one while set
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub radius: f64,
}

impl SimNode {
    /// A particle without a position yet; it is placed when the simulation starts
    pub fn new(id: impl Into<String>, radius: f64) -> Self {
        Self {
            id: id.into(),
            x: f64::NAN,
            y: f64::NAN,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            radius,
        }
    }

    /// A particle resuming from a previous layout
    pub fn at(id: impl Into<String>, radius: f64, position: Point, velocity: Point) -> Self {
        Self {
            x: position.x,
            y: position.y,
            vx: velocity.x,
            vy: velocity.y,
            ..Self::new(id, radius)
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SimLink {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

/// Linear congruential generator, so layouts are reproducible
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    fn new() -> Self {
        Self(1)
    }

    fn next(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        self.0 as f64 / Self::M as f64
    }

    /// Tiny displacement separating coincident particles
    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

/// The layout state
#[derive(Debug, Clone)]
pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    center: Point,
    alpha: f64,
    alpha_target: f64,
    alpha_decay: f64,
    running: bool,
    random: Lcg,
}

impl Simulation {
    /// Start a simulation at full energy.
    ///
    /// `links` are index pairs into `nodes`. Nodes without a position are laid
    /// out on a phyllotaxis spiral around `center`.
    pub fn new(mut nodes: Vec<SimNode>, links: &[(usize, usize)], center: Point) -> Self {
        place_nodes(&mut nodes, center);
        let links = build_links(nodes.len(), links);

        Self {
            nodes,
            links,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: alpha_decay(),
            running: true,
            random: Lcg::new(),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Resume stepping without resetting alpha
    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one step while running; stops once alpha falls below the minimum.
    /// Returns whether a step was taken.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.tick();
        if self.alpha < ALPHA_MIN {
            self.running = false;
        }
        true
    }

    /// Run until the simulation settles or `max_ticks` steps have passed
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.step() {
            ticks += 1;
        }
        ticks
    }

    /// One position update
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_charge(alpha);
        self.apply_center();
        self.apply_collision();

        let keep = 1.0 - VELOCITY_DECAY;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= keep;
                    node.y += node.vy;
                }
            }
        }
    }

    /// Pin a node at its current position and wake the layout
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.running = true;
        let node = &mut self.nodes[i];
        node.fx = Some(node.x);
        node.fy = Some(node.y);
        true
    }

    /// Move a pinned node
    pub fn drag_to(&mut self, id: &str, position: Point) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        node.fx = Some(position.x);
        node.fy = Some(position.y);
        true
    }

    /// Release a pinned node and let the layout cool down
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        self.alpha_target = 0.0;
        let node = &mut self.nodes[i];
        node.fx = None;
        node.fy = None;
        true
    }

    /// Springs toward the link distance, stiffer between low-degree nodes
    fn apply_links(&mut self, alpha: f64) {
        for k in 0..self.links.len() {
            let SimLink {
                source,
                target,
                strength,
                bias,
            } = self.links[k];
            let (s, t) = (&self.nodes[source], &self.nodes[target]);

            let mut x = t.x + t.vx - s.x - s.vx;
            if x == 0.0 {
                x = self.random.jiggle();
            }
            let mut y = t.y + t.vy - s.y - s.vy;
            if y == 0.0 {
                y = self.random.jiggle();
            }

            let l = (x * x + y * y).sqrt();
            let l = (l - LINK_DISTANCE) / l * alpha * strength;
            x *= l;
            y *= l;

            let t = &mut self.nodes[target];
            t.vx -= x * bias;
            t.vy -= y * bias;
            let s = &mut self.nodes[source];
            s.vx += x * (1.0 - bias);
            s.vy += y * (1.0 - bias);
        }
    }

    /// Exact pairwise repulsion
    fn apply_charge(&mut self, alpha: f64) {
        let n = self.nodes.len();
        let positions: Vec<Point> = self.nodes.iter().map(SimNode::position).collect();

        for i in 0..n {
            let (mut dvx, mut dvy) = (0.0, 0.0);
            for (j, other) in positions.iter().enumerate() {
                if i == j {
                    continue;
                }
                let mut x = other.x - positions[i].x;
                let mut y = other.y - positions[i].y;
                let mut l = x * x + y * y;
                if x == 0.0 {
                    x = self.random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.random.jiggle();
                    l += y * y;
                }
                if l < CHARGE_DISTANCE_MIN2 {
                    l = (CHARGE_DISTANCE_MIN2 * l).sqrt();
                }
                dvx += x * CHARGE_STRENGTH * alpha / l;
                dvy += y * CHARGE_STRENGTH * alpha / l;
            }
            self.nodes[i].vx += dvx;
            self.nodes[i].vy += dvy;
        }
    }

    /// Translate so the mean position sits on the centre
    fn apply_center(&mut self) {
        let n = self.nodes.len();
        if n == 0 {
            return;
        }
        let (sx, sy) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
        let dx = sx / n as f64 - self.center.x;
        let dy = sy / n as f64 - self.center.y;
        for node in &mut self.nodes {
            node.x -= dx;
            node.y -= dy;
        }
    }

    /// Push overlapping footprints apart, using positions predicted from velocity
    fn apply_collision(&mut self) {
        let n = self.nodes.len();
        for i in 0..n {
            let ri = self.nodes[i].radius;
            let ri2 = ri * ri;
            let xi = self.nodes[i].x + self.nodes[i].vx;
            let yi = self.nodes[i].y + self.nodes[i].vy;

            for j in (i + 1)..n {
                let rj = self.nodes[j].radius;
                let r = ri + rj;
                let mut x = xi - self.nodes[j].x - self.nodes[j].vx;
                let mut y = yi - self.nodes[j].y - self.nodes[j].vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.random.jiggle();
                    l += y * y;
                }
                let dist = l.sqrt();
                let push = (r - dist) / dist;
                x *= push;
                y *= push;

                let rj2 = rj * rj;
                let share = rj2 / (ri2 + rj2);
                self.nodes[i].vx += x * share;
                self.nodes[i].vy += y * share;
                self.nodes[j].vx -= x * (1.0 - share);
                self.nodes[j].vy -= y * (1.0 - share);
            }
        }
    }
}

fn place_nodes(nodes: &mut [SimNode], center: Point) {
    let angle_step = PI * (3.0 - 5.0_f64.sqrt());
    for (i, node) in nodes.iter_mut().enumerate() {
        if let Some(fx) = node.fx {
            node.x = fx;
        }
        if let Some(fy) = node.fy {
            node.y = fy;
        }
        if node.x.is_nan() || node.y.is_nan() {
            let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
            let angle = i as f64 * angle_step;
            node.x = center.x + radius * angle.cos();
            node.y = center.y + radius * angle.sin();
        }
        if node.vx.is_nan() || node.vy.is_nan() {
            node.vx = 0.0;
            node.vy = 0.0;
        }
    }
}

fn build_links(node_count: usize, links: &[(usize, usize)]) -> Vec<SimLink> {
    let links: Vec<(usize, usize)> = links
        .iter()
        .copied()
        .filter(|&(s, t)| s < node_count && t < node_count)
        .collect();

    let mut degree = vec![0usize; node_count];
    for &(s, t) in &links {
        degree[s] += 1;
        degree[t] += 1;
    }

    links
        .into_iter()
        .map(|(source, target)| {
            let (ds, dt) = (degree[source] as f64, degree[target] as f64);
            SimLink {
                source,
                target,
                strength: 1.0 / ds.min(dt),
                bias: ds / (ds + dt),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: &SimNode, b: &SimNode) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn test_initial_placement_is_phyllotaxis() {
        let nodes = vec![SimNode::new("A", 10.0), SimNode::new("B", 10.0)];
        let sim = Simulation::new(nodes, &[], Point::new(100.0, 50.0));
        let a = &sim.nodes()[0];
        assert!((a.x - (100.0 + 10.0 * 0.5_f64.sqrt())).abs() < 1e-9);
        assert!((a.y - 50.0).abs() < 1e-9);
        let b = &sim.nodes()[1];
        let r = ((b.x - 100.0).powi(2) + (b.y - 50.0).powi(2)).sqrt();
        assert!((r - 10.0 * 1.5_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_existing_positions_kept() {
        let nodes = vec![SimNode::at("A", 10.0, Point::new(7.0, 8.0), Point::default())];
        let sim = Simulation::new(nodes, &[], Point::default());
        assert_eq!(sim.nodes()[0].position(), Point::new(7.0, 8.0));
    }

    #[test]
    fn test_linked_pair_converges_near_link_distance() {
        let nodes = vec![SimNode::new("User", 140.0), SimNode::new("Post", 140.0)];
        let mut sim = Simulation::new(nodes, &[(0, 1)], Point::new(500.0, 400.0));
        let ticks = sim.settle(1000);

        assert!(!sim.is_running());
        assert!(ticks <= 301);
        let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
        assert!(d > 250.0 && d < 400.0, "distance {}", d);

        let mid_x = (sim.nodes()[0].x + sim.nodes()[1].x) / 2.0;
        let mid_y = (sim.nodes()[0].y + sim.nodes()[1].y) / 2.0;
        assert!((mid_x - 500.0).abs() < 1.0);
        assert!((mid_y - 400.0).abs() < 1.0);
    }

    #[test]
    fn test_collision_separates_unlinked_nodes() {
        let nodes = (0..5).map(|i| SimNode::new(format!("N{}", i), 140.0)).collect();
        let mut sim = Simulation::new(nodes, &[], Point::default());
        sim.settle(1000);

        let nodes = sim.nodes();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                assert!(distance(&nodes[i], &nodes[j]) > 200.0);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let run = || {
            let nodes = (0..4).map(|i| SimNode::new(format!("N{}", i), 100.0)).collect();
            let mut sim = Simulation::new(nodes, &[(0, 1), (1, 2), (2, 0), (3, 3)], Point::default());
            sim.settle(50);
            sim.nodes().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_drag_pins_and_releases() {
        let nodes = vec![SimNode::new("A", 100.0), SimNode::new("B", 100.0)];
        let mut sim = Simulation::new(nodes, &[(0, 1)], Point::default());
        sim.settle(1000);
        assert!(!sim.is_running());

        assert!(sim.drag_start("A"));
        assert!(sim.is_running());
        assert_eq!(sim.alpha_target(), DRAG_ALPHA_TARGET);

        sim.drag_to("A", Point::new(900.0, -300.0));
        sim.tick();
        assert_eq!(sim.node("A").unwrap().position(), Point::new(900.0, -300.0));

        sim.drag_end("A");
        assert_eq!(sim.alpha_target(), 0.0);
        assert!(sim.node("A").unwrap().fx.is_none());
        assert!(!sim.drag_start("Missing"));
    }

    #[test]
    fn test_link_strength_and_bias() {
        let links = build_links(3, &[(0, 1), (0, 2), (5, 0)]);
        assert_eq!(links.len(), 2);
        // degree: 0 -> 2, 1 -> 1, 2 -> 1
        assert_eq!(links[0].strength, 1.0);
        assert!((links[0].bias - 2.0 / 3.0).abs() < 1e-12);
    }
}
