//! Snapshot fetch against the backend's `GET /graph` endpoint.

use log::debug;
use url::form_urlencoded;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::components::force_graph::GraphData;
use crate::error::GraphError;

/// `{base}/graph`, with `?entity_id=` when a focal entity is given.
pub fn graph_url(base: &str, entity_id: Option<&str>) -> String {
	let base = base.trim_end_matches('/');
	match entity_id.map(str::trim).filter(|id| !id.is_empty()) {
		Some(id) => {
			let query = form_urlencoded::Serializer::new(String::new())
				.append_pair("entity_id", id)
				.finish();
			format!("{}/graph?{}", base, query)
		}
		None => format!("{}/graph", base),
	}
}

pub async fn fetch_graph(base: &str, entity_id: Option<&str>) -> Result<GraphData, GraphError> {
	let url = graph_url(base, entity_id);
	debug!("fetching graph from {}", url);

	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_mode(RequestMode::Cors);
	let request = Request::new_with_str_and_init(&url, &opts)
		.map_err(|e| GraphError::Request(format!("{:?}", e)))?;

	let window = web_sys::window().ok_or(GraphError::NoWindow)?;
	let resp_value = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(|e| GraphError::Request(format!("{:?}", e)))?;
	let resp: Response = resp_value
		.dyn_into()
		.map_err(|_| GraphError::Request("response is not a Response".into()))?;

	if !resp.ok() {
		return Err(GraphError::Status(resp.status()));
	}

	let text = JsFuture::from(resp.text().map_err(|e| GraphError::Body(format!("{:?}", e)))?)
		.await
		.map_err(|e| GraphError::Body(format!("{:?}", e)))?
		.as_string()
		.ok_or_else(|| GraphError::Body("body is not text".into()))?;

	Ok(GraphData::from_json(&text)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn url_without_focal_entity() {
		assert_eq!(graph_url("/api", None), "/api/graph");
		assert_eq!(graph_url("/api/", Some("  ")), "/api/graph");
	}

	#[test]
	fn url_encodes_focal_entity() {
		assert_eq!(
			graph_url("http://localhost:8000/api", Some("acme corp&co")),
			"http://localhost:8000/api/graph?entity_id=acme+corp%26co"
		);
	}
}
