use std::collections::HashSet;

use log::debug;

use super::interaction::PointerPhase;
use super::selection::{InspectorView, SelectionModel, related_nodes};
use super::simulation::{SimulationConfig, SimulationEngine, Vec2};
use super::snapshot::GraphSnapshot;

pub const NODE_RADIUS: f64 = 7.0;
pub const HIT_RADIUS: f64 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
}

/// One mounted graph view: the snapshot, the engine laid out from it, and
/// everything the pointer has done to it.
pub struct ForceGraphState {
	pub snapshot: GraphSnapshot,
	pub engine: SimulationEngine,
	pub selection: SelectionModel,
	pub transform: ViewTransform,
	pub pointer: PointerPhase,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	config: SimulationConfig,
}

impl ForceGraphState {
	pub fn new(snapshot: GraphSnapshot, config: SimulationConfig, width: f64, height: f64) -> Self {
		let engine = SimulationEngine::new(
			&snapshot,
			config.clone(),
			Vec2::new(width / 2.0, height / 2.0),
		);
		Self {
			snapshot,
			engine,
			selection: SelectionModel::default(),
			transform: ViewTransform::default(),
			pointer: PointerPhase::Idle,
			hover: HoverState::default(),
			width,
			height,
			config,
		}
	}

	/// Swaps in a freshly fetched snapshot. The old engine is stopped and a new one
	/// is laid out from scratch. Returns true if the selection had to close.
	pub fn replace_snapshot(&mut self, snapshot: GraphSnapshot) -> bool {
		self.engine.stop();
		self.engine = SimulationEngine::new(
			&snapshot,
			self.config.clone(),
			Vec2::new(self.width / 2.0, self.height / 2.0),
		);
		self.snapshot = snapshot;
		self.pointer = PointerPhase::Idle;
		self.hover = HoverState::default();
		let closed = self.selection.reconcile(&self.snapshot);
		debug!("graph snapshot replaced (selection closed: {})", closed);
		closed
	}

	pub fn teardown(&mut self) {
		self.engine.stop();
		self.pointer = PointerPhase::Idle;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Vec2 {
		Vec2::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Closest node within the hit radius of a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let point = self.screen_to_graph(sx, sy);
		self.engine
			.positions()
			.enumerate()
			.map(|(idx, pos)| (idx, pos.distance(point)))
			.filter(|(_, d)| *d < HIT_RADIUS)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Keep the old highlight around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(id) = node.and_then(|idx| self.snapshot.nodes().get(idx)).map(|n| n.id.as_str()) {
			for related in related_nodes(&self.snapshot, Some(id)) {
				if let Some(idx) = self.snapshot.index_of(&related.id) {
					self.hover.neighbors.insert(idx);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.is_hovered(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn is_selected(&self, idx: usize) -> bool {
		self.selection
			.selected()
			.is_some_and(|id| self.snapshot.index_of(id) == Some(idx))
	}

	pub fn tick(&mut self, dt: f64) {
		self.engine.step();

		let (target, speed) = if self.hover.node.is_some() {
			(1.0, 6.0)
		} else {
			(0.0, 4.0)
		};
		self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}
	}

	/// Moves the layout center to the new viewport center and wakes a settled
	/// layout so it drifts there.
	pub fn resize(&mut self, width: f64, height: f64) {
		if width == self.width && height == self.height {
			return;
		}
		self.width = width;
		self.height = height;
		self.engine.set_center(Vec2::new(width / 2.0, height / 2.0));
		self.engine.reheat(self.config.drag_alpha);
	}

	pub fn inspector_view(&self) -> Option<InspectorView> {
		InspectorView::build(&self.snapshot, &self.selection)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::snapshot::fixtures::snapshot;

	fn state() -> ForceGraphState {
		ForceGraphState::new(
			snapshot(&["a", "b", "c"], &[("a", "b")]),
			SimulationConfig::default(),
			800.0,
			600.0,
		)
	}

	#[test]
	fn replacing_snapshot_rebuilds_engine_and_reconciles_selection() {
		let mut st = state();
		for _ in 0..20 {
			st.tick(0.016);
		}
		st.selection.click_node("b");

		assert!(!st.replace_snapshot(snapshot(&["b", "d"], &[])));
		assert_eq!(st.engine.alpha(), 1.0);
		assert_eq!(st.engine.len(), 2);
		assert_eq!(st.selection.selected(), Some("b"));

		assert!(st.replace_snapshot(snapshot(&["d"], &[])));
		assert!(!st.selection.is_open());
		assert_eq!(st.inspector_view(), None);
	}

	#[test]
	fn node_at_position_respects_transform() {
		let mut st = state();
		let a = st.engine.position(0).unwrap();
		assert_eq!(st.node_at_position(a.x, a.y), Some(0));

		st.transform = ViewTransform {
			x: 100.0,
			y: 50.0,
			k: 2.0,
		};
		let (sx, sy) = (a.x * 2.0 + 100.0, a.y * 2.0 + 50.0);
		assert_eq!(st.node_at_position(sx, sy), Some(0));
		assert_eq!(st.node_at_position(-5000.0, -5000.0), None);
	}

	#[test]
	fn hover_highlights_related_nodes_and_fades_out() {
		let mut st = state();
		st.set_hover(Some(0));
		assert!(st.is_highlighted(0));
		assert!(st.is_highlighted(1));
		assert!(!st.is_highlighted(2));

		st.set_hover(None);
		assert!(st.has_active_highlight());
		for _ in 0..200 {
			st.tick(0.016);
		}
		assert!(!st.has_active_highlight());
	}

	fn centroid(st: &ForceGraphState) -> Vec2 {
		let sum = st.engine.positions().fold(Vec2::ZERO, |acc, p| acc + p);
		sum * (1.0 / st.engine.len() as f64)
	}

	#[test]
	fn resize_recenters_settled_layout() {
		let mut st = state();
		for _ in 0..800 {
			st.tick(0.016);
		}
		assert!(st.engine.settled());
		assert!(centroid(&st).distance(Vec2::new(400.0, 300.0)) < 1.0);

		st.resize(1200.0, 600.0);
		assert!(!st.engine.settled());
		for _ in 0..1500 {
			st.tick(0.016);
		}
		let moved = centroid(&st);
		assert!(moved.distance(Vec2::new(600.0, 300.0)) < 40.0, "centroid {:?}", moved);
		assert!(moved.distance(Vec2::new(400.0, 300.0)) > 150.0, "centroid {:?}", moved);
	}

	#[test]
	fn resize_to_same_size_leaves_layout_asleep() {
		let mut st = state();
		for _ in 0..800 {
			st.tick(0.016);
		}
		st.resize(800.0, 600.0);
		assert!(st.engine.settled());
	}

	#[test]
	fn teardown_stops_engine() {
		let mut st = state();
		st.teardown();
		assert!(st.engine.is_stopped());
	}
}
