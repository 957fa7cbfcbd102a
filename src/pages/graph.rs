use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;
use log::{debug, info, warn};

use crate::api::fetch_graph;
use crate::components::force_graph::{ForceGraphCanvas, Generation, GraphSnapshot};
use crate::config::AppConfig;

/// Graph page. Loads the snapshot around the `entity_id` query parameter and
/// refetches whenever it changes.
#[component]
pub fn GraphPage() -> impl IntoView {
	let config = AppConfig::load();
	let query = use_query_map();
	let entity_id = Memo::new(move |_| query.with(|q| q.get("entity_id")));

	// The last good snapshot stays on screen when a fetch fails
	let snapshot = RwSignal::new(GraphSnapshot::default());
	let error = RwSignal::new(None::<String>);
	let generation = Generation::default();

	let fetches = generation.clone();
	Effect::new(move |_| {
		let entity = entity_id.get();
		let ticket = fetches.advance();
		let base = config.api_base.clone();
		spawn_local(async move {
			let result = fetch_graph(&base, entity.as_deref()).await;
			if !ticket.is_current() {
				debug!("discarding stale graph response for {:?}", entity);
				return;
			}
			match result {
				Ok(data) => {
					error.set(None);
					snapshot.set(GraphSnapshot::from_data(data));
				}
				Err(err) => {
					warn!("graph fetch failed: {}", err);
					error.set(Some(err.to_string()));
				}
			}
		});
	});

	on_cleanup(move || {
		generation.advance();
	});

	let notebook = Callback::new(move |node_id: String| {
		info!("add to notebook requested for node {}", node_id);
	});

	view! {
		<div class="fullscreen-graph">
			<ForceGraphCanvas data=snapshot fullscreen=true on_add_to_notebook=Some(notebook) />
			<div class="graph-overlay">
				<h1>"Event Graph"</h1>
				<p class="subtitle">
					"Click a node to inspect it. Drag nodes to reposition. Scroll to zoom."
				</p>
				{move || {
					(snapshot.with(GraphSnapshot::is_empty) && error.with(Option::is_none))
						.then(|| view! { <p class="graph-empty">"No graph data yet."</p> })
				}}
				{move || {
					error
						.get()
						.map(|msg| {
							view! {
								<div class="graph-error" role="alert">
									"Could not load graph: " {msg}
								</div>
							}
						})
				}}
			</div>
		</div>
	}
}
