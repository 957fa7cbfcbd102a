use log::debug;

use super::simulation::Vec2;
use super::state::ForceGraphState;

/// Screen distance a pressed pointer may travel and still count as a click.
pub const CLICK_SLOP: f64 = 4.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

/// `Idle -> PointerDown -> {Dragging | Panning | click}`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerPhase {
	#[default]
	Idle,
	PointerDown {
		node: Option<usize>,
		origin: (f64, f64),
	},
	Dragging {
		node: usize,
		/// Node position minus pointer position at grab time, in graph space.
		grab: Vec2,
	},
	Panning {
		origin: (f64, f64),
		transform_start: (f64, f64),
	},
}

/// How a press/release pair was resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
	/// Click on a node, or on empty canvas when `None`.
	Click(Option<usize>),
	Drag(usize),
	Pan,
	Ignored,
}

impl ForceGraphState {
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.pointer = PointerPhase::PointerDown {
			node: self.node_at_position(sx, sy),
			origin: (sx, sy),
		};
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		match self.pointer {
			PointerPhase::Idle => {
				let hovered = self.node_at_position(sx, sy);
				self.set_hover(hovered);
			}
			PointerPhase::PointerDown { node, origin } => {
				if (sx - origin.0).hypot(sy - origin.1) < CLICK_SLOP {
					return;
				}
				match node {
					Some(idx) => {
						self.begin_drag(idx, origin);
						self.drag_to(sx, sy);
					}
					None => {
						self.pointer = PointerPhase::Panning {
							origin,
							transform_start: (self.transform.x, self.transform.y),
						};
						self.pan_to(sx, sy);
					}
				}
			}
			PointerPhase::Dragging { .. } => self.drag_to(sx, sy),
			PointerPhase::Panning { .. } => self.pan_to(sx, sy),
		}
	}

	pub fn pointer_up(&mut self) -> Gesture {
		match std::mem::take(&mut self.pointer) {
			PointerPhase::PointerDown { node: Some(idx), .. } => {
				if let Some(node) = self.snapshot.nodes().get(idx) {
					self.selection.click_node(&node.id);
				}
				Gesture::Click(Some(idx))
			}
			PointerPhase::PointerDown { node: None, .. } => {
				self.selection.dismiss();
				Gesture::Click(None)
			}
			PointerPhase::Dragging { node, .. } => {
				self.end_drag(node);
				Gesture::Drag(node)
			}
			PointerPhase::Panning { .. } => Gesture::Pan,
			PointerPhase::Idle => Gesture::Ignored,
		}
	}

	/// Pointer left the canvas: abandon any gesture without selecting.
	pub fn pointer_leave(&mut self) {
		if let PointerPhase::Dragging { node, .. } = std::mem::take(&mut self.pointer) {
			self.end_drag(node);
		}
		self.set_hover(None);
	}

	/// Returns true if an open selection was closed.
	pub fn escape(&mut self) -> bool {
		let was_open = self.selection.is_open();
		self.selection.dismiss();
		was_open
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	fn begin_drag(&mut self, idx: usize, origin: (f64, f64)) {
		let Some(position) = self.engine.position(idx) else {
			self.pointer = PointerPhase::Idle;
			return;
		};
		let drag_alpha = self.engine.config().drag_alpha;
		self.engine.pin(idx, position);
		self.engine.reheat(drag_alpha);
		self.engine.set_alpha_target(drag_alpha);
		self.pointer = PointerPhase::Dragging {
			node: idx,
			grab: position - self.screen_to_graph(origin.0, origin.1),
		};
		debug!("drag started on node {}", idx);
	}

	fn drag_to(&mut self, sx: f64, sy: f64) {
		if let PointerPhase::Dragging { node, grab } = self.pointer {
			let at = self.screen_to_graph(sx, sy) + grab;
			self.engine.pin(node, at);
		}
	}

	fn end_drag(&mut self, idx: usize) {
		self.engine.unpin(idx);
		self.engine.set_alpha_target(0.0);
	}

	fn pan_to(&mut self, sx: f64, sy: f64) {
		if let PointerPhase::Panning {
			origin,
			transform_start,
		} = self.pointer
		{
			self.transform.x = transform_start.0 + (sx - origin.0);
			self.transform.y = transform_start.1 + (sy - origin.1);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::simulation::SimulationConfig;
	use crate::components::force_graph::snapshot::fixtures::snapshot;
	use crate::components::force_graph::state::ViewTransform;

	fn state() -> ForceGraphState {
		ForceGraphState::new(
			snapshot(&["a", "b", "c"], &[("a", "b"), ("a", "c")]),
			SimulationConfig::default(),
			800.0,
			600.0,
		)
	}

	fn screen_of(st: &ForceGraphState, idx: usize) -> (f64, f64) {
		let p = st.engine.position(idx).unwrap();
		(p.x, p.y)
	}

	#[test]
	fn click_on_node_opens_selection() {
		let mut st = state();
		let (x, y) = screen_of(&st, 1);
		st.pointer_down(x, y);
		st.pointer_move(x + 1.0, y + 1.0);
		assert_eq!(st.pointer_up(), Gesture::Click(Some(1)));
		assert_eq!(st.selection.selected(), Some("b"));
		assert_eq!(st.engine.pin_of(1), None);
	}

	#[test]
	fn click_on_empty_canvas_closes_selection() {
		let mut st = state();
		st.selection.click_node("a");
		st.pointer_down(-900.0, -900.0);
		assert_eq!(st.pointer_up(), Gesture::Click(None));
		assert!(!st.selection.is_open());
	}

	#[test]
	fn escape_closes_only_when_open() {
		let mut st = state();
		assert!(!st.escape());
		st.selection.click_node("c");
		assert!(st.escape());
		assert!(!st.selection.is_open());
	}

	#[test]
	fn drag_pins_node_to_pointer_and_reheats() {
		let mut st = state();
		for _ in 0..800 {
			st.tick(0.016);
		}
		assert!(st.engine.settled());

		let (x, y) = screen_of(&st, 0);
		st.pointer_down(x, y);
		st.pointer_move(x + 30.0, y - 10.0);
		assert!(matches!(st.pointer, PointerPhase::Dragging { node: 0, .. }));
		assert!(!st.engine.settled());
		assert_eq!(st.engine.alpha_target(), 0.3);

		st.pointer_move(x + 50.0, y + 5.0);
		let pin = st.engine.pin_of(0).unwrap();
		assert!((pin.x - (x + 50.0)).abs() < 1e-9);
		assert!((pin.y - (y + 5.0)).abs() < 1e-9);

		st.tick(0.016);
		assert_eq!(st.engine.position(0), Some(pin));
	}

	#[test]
	fn drag_end_unpins_without_freezing_alpha() {
		let mut st = state();
		let (x, y) = screen_of(&st, 0);
		st.pointer_down(x, y);
		st.pointer_move(x + 40.0, y);
		assert_eq!(st.pointer_up(), Gesture::Drag(0));

		assert_eq!(st.engine.pin_of(0), None);
		assert_eq!(st.engine.alpha_target(), 0.0);
		assert!(st.engine.alpha() > 0.0);
		assert!(!st.selection.is_open());
	}

	#[test]
	fn drag_respects_zoomed_transform() {
		let mut st = state();
		st.transform = ViewTransform {
			x: 10.0,
			y: 20.0,
			k: 2.0,
		};
		let p = st.engine.position(2).unwrap();
		let (x, y) = (p.x * 2.0 + 10.0, p.y * 2.0 + 20.0);
		st.pointer_down(x, y);
		st.pointer_move(x + 20.0, y);
		let pin = st.engine.pin_of(2).unwrap();
		assert!((pin.x - (p.x + 10.0)).abs() < 1e-9);
		assert!((pin.y - p.y).abs() < 1e-9);
	}

	#[test]
	fn pan_moves_view_and_keeps_selection() {
		let mut st = state();
		st.selection.click_node("a");
		st.pointer_down(-900.0, -900.0);
		st.pointer_move(-880.0, -890.0);
		assert_eq!(st.pointer_up(), Gesture::Pan);
		assert_eq!((st.transform.x, st.transform.y), (20.0, 10.0));
		assert_eq!(st.selection.selected(), Some("a"));
	}

	#[test]
	fn leaving_canvas_mid_drag_releases_pin() {
		let mut st = state();
		let (x, y) = screen_of(&st, 1);
		st.pointer_down(x, y);
		st.pointer_move(x + 40.0, y);
		st.pointer_leave();
		assert_eq!(st.pointer, PointerPhase::Idle);
		assert_eq!(st.engine.pin_of(1), None);
	}

	#[test]
	fn hover_follows_idle_pointer() {
		let mut st = state();
		let (x, y) = screen_of(&st, 2);
		st.pointer_move(x, y);
		assert_eq!(st.hover.node, Some(2));
		assert!(st.is_highlighted(0));
		assert!(!st.selection.is_open());
	}

	#[test]
	fn zoom_is_clamped() {
		let mut st = state();
		for _ in 0..100 {
			st.zoom_at(0.0, 0.0, -1.0);
		}
		assert_eq!(st.transform.k, MAX_ZOOM);
		for _ in 0..100 {
			st.zoom_at(0.0, 0.0, 1.0);
		}
		assert_eq!(st.transform.k, MIN_ZOOM);
	}
}
