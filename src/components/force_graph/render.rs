use std::cell::Cell;
use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::simulation::Vec2;
use super::state::{ForceGraphState, NODE_RADIUS, ViewTransform};
use super::types::NodeKind;

const BACKGROUND: &str = "#fafafa";
const EVENT_FILL: &str = "#e53935";
const ENTITY_FILL: &str = "#1e88e5";

/// Counter shared by the frame loop, pending fetches and teardown. Advancing it
/// invalidates every `Ticket` handed out before.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
	#[cfg(test)]
	pub fn current(&self) -> Ticket {
		Ticket {
			value: self.0.load(Ordering::SeqCst),
			generation: self.clone(),
		}
	}

	pub fn advance(&self) -> Ticket {
		let value = self.0.fetch_add(1, Ordering::SeqCst) + 1;
		Ticket {
			value,
			generation: self.clone(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct Ticket {
	value: u64,
	generation: Generation,
}

impl Ticket {
	pub fn is_current(&self) -> bool {
		self.generation.0.load(Ordering::SeqCst) == self.value
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSprite {
	pub at: Vec2,
	pub kind: NodeKind,
	pub label: String,
	pub highlighted: bool,
	pub hovered: bool,
	pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSegment {
	pub from: Vec2,
	pub to: Vec2,
	pub weight: f64,
	pub highlighted: bool,
}

/// Geometry for one render pass, derived from state and nothing else.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
	pub width: f64,
	pub height: f64,
	pub transform: ViewTransform,
	/// Eased 0..1 strength of the hover highlight.
	pub highlight: f64,
	pub dimmed: bool,
	pub nodes: Vec<NodeSprite>,
	pub edges: Vec<EdgeSegment>,
}

pub fn project(state: &ForceGraphState) -> Frame {
	let nodes = state
		.snapshot
		.nodes()
		.iter()
		.zip(state.engine.positions())
		.enumerate()
		.map(|(idx, (node, at))| NodeSprite {
			at,
			kind: node.kind,
			label: node.label.clone(),
			highlighted: state.is_highlighted(idx),
			hovered: state.is_hovered(idx),
			selected: state.is_selected(idx),
		})
		.collect();

	let edges = state
		.snapshot
		.edges()
		.iter()
		.filter_map(|edge| {
			let (s, t) = state.snapshot.endpoints(edge)?;
			Some(EdgeSegment {
				from: state.engine.position(s)?,
				to: state.engine.position(t)?,
				weight: edge.weight,
				highlighted: state.is_highlighted(s) && state.is_highlighted(t),
			})
		})
		.collect();

	Frame {
		width: state.width,
		height: state.height,
		transform: state.transform,
		highlight: ease_out_cubic(state.hover.highlight_t),
		dimmed: state.has_active_highlight(),
		nodes,
		edges,
	}
}

/// Anything a frame can be drawn onto.
pub trait Surface {
	fn present(&mut self, frame: &Frame);
}

/// Pushes one projected frame per tick, and only for the current generation.
#[derive(Debug, Default)]
pub struct RenderSync {
	generation: Generation,
	rendering: Cell<bool>,
}

impl RenderSync {
	pub fn new(generation: Generation) -> Self {
		Self {
			generation,
			..Self::default()
		}
	}

	/// Starts a new generation for a freshly built engine.
	pub fn begin(&self) -> Ticket {
		self.generation.advance()
	}

	/// Teardown: every ticket issued so far goes stale.
	pub fn invalidate(&self) {
		self.generation.advance();
	}

	/// Draws `state` if `ticket` is still current. Returns whether a frame went out.
	pub fn apply<S: Surface + ?Sized>(
		&self,
		ticket: &Ticket,
		state: &ForceGraphState,
		surface: &mut S,
	) -> bool {
		if !ticket.is_current() || self.rendering.replace(true) {
			return false;
		}
		surface.present(&project(state));
		self.rendering.set(false);
		true
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// 2D canvas backend.
pub struct CanvasSurface {
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}
}

impl Surface for CanvasSurface {
	fn present(&mut self, frame: &Frame) {
		let ctx = &self.ctx;
		ctx.set_fill_style_str(BACKGROUND);
		ctx.fill_rect(0.0, 0.0, frame.width, frame.height);
		ctx.save();
		let _ = ctx.translate(frame.transform.x, frame.transform.y);
		let _ = ctx.scale(frame.transform.k, frame.transform.k);
		draw_edges(frame, ctx);
		draw_nodes(frame, ctx);
		ctx.restore();
	}
}

fn draw_edges(frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let (k, t) = (frame.transform.k, frame.highlight);
	let dash = js_sys::Array::of2(&JsValue::from_f64(4.0 / k), &JsValue::from_f64(4.0 / k));
	let solid = js_sys::Array::new();

	for edge in &frame.edges {
		if edge.from.distance(edge.to) < 0.001 {
			continue;
		}
		let alpha = match (frame.dimmed, edge.highlighted) {
			(false, _) => 0.6,
			(true, true) => 0.6 + 0.3 * t,
			(true, false) => 0.6 - 0.45 * t,
		};
		ctx.set_stroke_style_str(&format!("rgba(120, 120, 120, {})", alpha));
		ctx.set_line_width((1.0 + edge.weight.min(4.0) * 0.5) / k);
		// Zero-weight relations pull nothing; draw them dashed.
		let _ = ctx.set_line_dash(if edge.weight > 0.0 { &solid } else { &dash });
		ctx.begin_path();
		ctx.move_to(edge.from.x, edge.from.y);
		ctx.line_to(edge.to.x, edge.to.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&solid);
}

fn draw_nodes(frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let (k, t) = (frame.transform.k, frame.highlight);
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));

	for node in &frame.nodes {
		let faded = frame.dimmed && !node.highlighted;
		let radius = if node.hovered {
			NODE_RADIUS * (1.0 + 0.3 * t)
		} else {
			NODE_RADIUS
		};

		ctx.set_global_alpha(if faded { 1.0 - 0.7 * t } else { 1.0 });
		glyph_path(ctx, node.kind, node.at, radius);
		ctx.set_fill_style_str(match node.kind {
			NodeKind::Event => EVENT_FILL,
			NodeKind::Entity => ENTITY_FILL,
		});
		ctx.fill();

		if node.selected || node.hovered {
			ctx.set_stroke_style_str("#000");
			ctx.set_line_width(if node.selected { 2.0 / k } else { 1.0 / k });
			ctx.stroke();
		}

		ctx.set_fill_style_str("#333");
		let _ = ctx.fill_text(&node.label, node.at.x + radius + 3.0, node.at.y + 3.0);
		ctx.set_global_alpha(1.0);
	}
}

/// Events are circles, entities squares.
fn glyph_path(ctx: &CanvasRenderingContext2d, kind: NodeKind, at: Vec2, radius: f64) {
	ctx.begin_path();
	match kind {
		NodeKind::Event => {
			let _ = ctx.arc(at.x, at.y, radius, 0.0, 2.0 * PI);
		}
		NodeKind::Entity => {
			let half = radius * 0.85;
			ctx.rect(at.x - half, at.y - half, half * 2.0, half * 2.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::simulation::SimulationConfig;
	use crate::components::force_graph::snapshot::fixtures::snapshot;

	#[derive(Default)]
	struct Recorder {
		frames: Vec<Frame>,
	}

	impl Surface for Recorder {
		fn present(&mut self, frame: &Frame) {
			self.frames.push(frame.clone());
		}
	}

	fn state() -> ForceGraphState {
		ForceGraphState::new(
			snapshot(&["a", "b", "c"], &[("a", "b"), ("b", "c")]),
			SimulationConfig::default(),
			800.0,
			600.0,
		)
	}

	#[test]
	fn projection_mirrors_engine_positions() {
		let mut st = state();
		st.tick(0.016);
		st.selection.click_node("c");
		let frame = project(&st);

		let positions: Vec<Vec2> = st.engine.positions().collect();
		assert_eq!(frame.nodes.iter().map(|n| n.at).collect::<Vec<_>>(), positions);
		assert_eq!(frame.edges.len(), 2);
		assert_eq!(frame.edges[1].from, positions[1]);
		assert_eq!(frame.edges[1].to, positions[2]);
		assert!(frame.nodes[2].selected);
		assert!(!frame.nodes[0].selected);
	}

	#[test]
	fn stale_tickets_are_discarded() {
		let st = state();
		let sync = RenderSync::new(Generation::default());
		let mut surface = Recorder::default();

		let first = sync.begin();
		assert!(sync.apply(&first, &st, &mut surface));

		let second = sync.begin();
		assert!(!first.is_current());
		assert!(!sync.apply(&first, &st, &mut surface));
		assert!(sync.apply(&second, &st, &mut surface));

		sync.invalidate();
		assert!(!sync.apply(&second, &st, &mut surface));
		assert_eq!(surface.frames.len(), 2);
	}

	#[test]
	fn tickets_share_one_counter_across_clones() {
		let generation = Generation::default();
		let ticket = generation.current();
		assert!(ticket.is_current());
		generation.clone().advance();
		assert!(!ticket.is_current());
		assert!(generation.current().is_current());
	}
}
