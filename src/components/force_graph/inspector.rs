use leptos::prelude::*;

use super::selection::{InspectorView, RelatedNode};

fn related_line(node: &RelatedNode) -> String {
	match &node.relation {
		Some(relation) => format!("{} ({}) - {}", node.label, node.kind, relation),
		None => format!("{} ({})", node.label, node.kind),
	}
}

/// Side panel describing the selected node. Renders nothing while closed.
#[component]
pub fn InspectorPanel(
	#[prop(into)] details: Signal<Option<InspectorView>>,
	on_close: Callback<()>,
	#[prop(default = None)] on_add_to_notebook: Option<Callback<String>>,
) -> impl IntoView {
	let close_ref = NodeRef::<leptos::html::Button>::new();

	// Move focus to the dismiss control whenever the panel opens
	Effect::new(move |_| {
		if details.with(Option::is_some) {
			if let Some(button) = close_ref.get() {
				let _ = button.focus();
			}
		}
	});

	move || {
		details.get().map(|d| {
			let notebook = on_add_to_notebook.map(|cb| {
				let id = d.id.clone();
				view! {
					<button class="inspector-notebook" on:click=move |_| cb.run(id.clone())>
						"Add to notebook"
					</button>
				}
			});

			view! {
				<aside class="inspector" role="dialog" aria-modal="true" aria-label=d.label.clone()>
					<button
						class="inspector-close"
						node_ref=close_ref
						aria-label="Close"
						on:click=move |_| on_close.run(())
					>
						"\u{00d7}"
					</button>
					<h2>{d.label.clone()}</h2>
					<div>"ID: " {d.id.clone()}</div>
					<div>"Kind: " {d.kind.to_string()}</div>
					{d.node_type.clone().map(|t| view! { <div>"Type: " {t}</div> })}
					<div class="inspector-related">"Related:"</div>
					<ul>
						{d
							.related
							.iter()
							.map(|r| view! { <li>{related_line(r)}</li> })
							.collect_view()}
					</ul>
					{notebook}
				</aside>
			}
		})
	}
}
