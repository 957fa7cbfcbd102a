use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev;
use leptos::leptos_dom::helpers::{
	AnimationFrameRequestHandle, WindowListenerHandle, request_animation_frame_with_handle,
	window_event_listener,
};
use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::inspector::InspectorPanel;
use super::render::{CanvasSurface, Generation, RenderSync, Ticket};
use super::selection::InspectorView;
use super::simulation::SimulationConfig;
use super::snapshot::GraphSnapshot;
use super::state::ForceGraphState;

const FRAME_DT: f64 = 0.016;

/// Everything one mounted canvas shares between its callbacks.
struct Runtime {
	state: RefCell<Option<ForceGraphState>>,
	surface: RefCell<Option<CanvasSurface>>,
	sync: RenderSync,
	pending: RefCell<Option<AnimationFrameRequestHandle>>,
	listeners: RefCell<Vec<WindowListenerHandle>>,
}

impl Runtime {
	fn new() -> Self {
		Self {
			state: RefCell::new(None),
			surface: RefCell::new(None),
			sync: RenderSync::new(Generation::default()),
			pending: RefCell::new(None),
			listeners: RefCell::new(Vec::new()),
		}
	}

	fn with_state<R>(&self, f: impl FnOnce(&mut ForceGraphState) -> R) -> Option<R> {
		self.state.borrow_mut().as_mut().map(f)
	}

	/// One tick: step the engine, then hand the result to the surface.
	fn frame(&self, ticket: &Ticket) {
		let mut state = self.state.borrow_mut();
		let Some(st) = state.as_mut() else {
			return;
		};
		st.tick(FRAME_DT);
		if let Some(surface) = self.surface.borrow_mut().as_mut() {
			self.sync.apply(ticket, st, surface);
		}
	}

	fn stop_frames(&self) {
		if let Some(handle) = self.pending.borrow_mut().take() {
			handle.cancel();
		}
	}

	fn teardown(&self) {
		self.sync.invalidate();
		self.stop_frames();
		if let Some(st) = self.state.borrow_mut().as_mut() {
			st.teardown();
		}
		self.surface.borrow_mut().take();
		for listener in self.listeners.borrow_mut().drain(..) {
			listener.remove();
		}
		debug!("graph view torn down");
	}

	/// Mirrors the selection into the signal the inspector renders from.
	fn publish(&self, inspector: RwSignal<Option<InspectorView>>) {
		let next = self.with_state(|s| s.inspector_view()).flatten();
		if inspector.with_untracked(|current| *current != next) {
			inspector.set(next);
		}
	}
}

/// Self-rescheduling tick loop. Each callback checks its ticket first, so a
/// frame queued before teardown or a snapshot swap does nothing.
fn schedule_frame(runtime: Rc<Runtime>, ticket: Ticket) {
	let next = runtime.clone();
	let requested = request_animation_frame_with_handle(move || {
		if !ticket.is_current() {
			return;
		}
		next.frame(&ticket);
		schedule_frame(next, ticket);
	});
	match requested {
		Ok(handle) => *runtime.pending.borrow_mut() = Some(handle),
		Err(err) => warn!("could not schedule animation frame: {:?}", err),
	}
}

fn window_size() -> Option<(f64, f64)> {
	let window = web_sys::window()?;
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphSnapshot>,
	#[prop(optional)] config: SimulationConfig,
	#[prop(default = None)] on_add_to_notebook: Option<Callback<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime = Rc::new(Runtime::new());
	let handle = StoredValue::new_local(runtime.clone());
	let inspector = RwSignal::new(None::<InspectorView>);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let snapshot = data.get();

		let (w, h) = if fullscreen {
			window_size().unwrap_or((800.0, 600.0))
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
				height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let Some(ctx) = context_2d(&canvas) else {
			warn!("canvas has no 2d context; graph view disabled");
			return;
		};

		// A new snapshot retires the old engine and its frame loop
		runtime.stop_frames();
		{
			let mut slot = runtime.state.borrow_mut();
			match slot.as_mut() {
				Some(st) => {
					st.resize(w, h);
					st.replace_snapshot(snapshot);
				}
				None => *slot = Some(ForceGraphState::new(snapshot, config.clone(), w, h)),
			}
		}
		*runtime.surface.borrow_mut() = Some(CanvasSurface::new(ctx));
		runtime.publish(inspector);
		schedule_frame(runtime.clone(), runtime.sync.begin());
	});

	let escape = window_event_listener(ev::keydown, move |ev: KeyboardEvent| {
		if ev.key() != "Escape" {
			return;
		}
		handle.try_with_value(|rt| {
			if rt.with_state(|s| s.escape()).unwrap_or(false) {
				rt.publish(inspector);
			}
		});
	});
	handle.with_value(|rt| rt.listeners.borrow_mut().push(escape));

	if fullscreen {
		let resize = window_event_listener(ev::resize, move |_| {
			let Some((w, h)) = window_size() else {
				return;
			};
			if let Some(canvas) = canvas_ref.get_untracked() {
				let canvas: HtmlCanvasElement = canvas.into();
				canvas.set_width(w as u32);
				canvas.set_height(h as u32);
			}
			handle.try_with_value(|rt| rt.with_state(|s| s.resize(w, h)));
		});
		handle.with_value(|rt| rt.listeners.borrow_mut().push(resize));
	}

	on_cleanup(move || {
		handle.try_with_value(|rt| rt.teardown());
	});

	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		handle.with_value(|rt| rt.with_state(|s| s.pointer_down(x, y)));
	};

	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		handle.with_value(|rt| rt.with_state(|s| s.pointer_move(x, y)));
	};

	let on_mouseup = move |_: MouseEvent| {
		handle.with_value(|rt| {
			rt.with_state(|s| s.pointer_up());
			rt.publish(inspector);
		});
	};

	let on_mouseleave = move |_: MouseEvent| {
		handle.with_value(|rt| rt.with_state(|s| s.pointer_leave()));
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		handle.with_value(|rt| rt.with_state(|s| s.zoom_at(x, y, ev.delta_y())));
	};

	let on_close = Callback::new(move |_: ()| {
		handle.try_with_value(|rt| {
			rt.with_state(|s| s.selection.dismiss());
			rt.publish(inspector);
		});
	});

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
		<InspectorPanel
			details=inspector
			on_close=on_close
			on_add_to_notebook=on_add_to_notebook
		/>
	}
}
