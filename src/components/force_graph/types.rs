use std::fmt;

use serde::{Deserialize, Deserializer};

/// Node or edge identifier as sent by the API: either a string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Text(String),
	Number(serde_json::Number),
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match RawId::deserialize(deserializer)? {
		RawId::Text(s) => s,
		RawId::Number(n) => n.to_string(),
	})
}

fn default_weight() -> f64 {
	1.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	#[default]
	Entity,
	Event,
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			NodeKind::Entity => "entity",
			NodeKind::Event => "event",
		})
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeRecord {
	#[serde(deserialize_with = "id_string")]
	pub id: String,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub kind: NodeKind,
	#[serde(default, rename = "type")]
	pub node_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EdgeRecord {
	#[serde(alias = "src", deserialize_with = "id_string")]
	pub source: String,
	#[serde(alias = "dst", deserialize_with = "id_string")]
	pub target: String,
	#[serde(default = "default_weight")]
	pub weight: f64,
	#[serde(default)]
	pub relation: Option<String>,
}

/// One graph payload as returned by `GET /graph`.
///
/// Older endpoints call the edge list `links`; both spellings land in `edges`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<NodeRecord>,
	pub edges: Vec<EdgeRecord>,
}

#[derive(Deserialize)]
struct RawGraph {
	#[serde(default)]
	nodes: Vec<NodeRecord>,
	#[serde(default)]
	edges: Option<Vec<EdgeRecord>>,
	#[serde(default)]
	links: Option<Vec<EdgeRecord>>,
}

impl<'de> Deserialize<'de> for GraphData {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = RawGraph::deserialize(deserializer)?;
		Ok(GraphData {
			nodes: raw.nodes,
			edges: raw.edges.or(raw.links).unwrap_or_default(),
		})
	}
}

impl GraphData {
	pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn decode(value: serde_json::Value) -> GraphData {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn links_spelling_is_normalised_to_edges() {
		let data = decode(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }],
			"links": [{ "source": "a", "target": "b" }]
		}));
		assert_eq!(data.edges.len(), 1);
		assert_eq!(data.edges[0].source, "a");
		assert_eq!(data.edges[0].weight, 1.0);
	}

	#[test]
	fn edges_win_over_links_when_both_present() {
		let data = decode(json!({
			"nodes": [],
			"edges": [{ "source": "a", "target": "b", "weight": 2 }],
			"links": [{ "source": "x", "target": "y" }]
		}));
		assert_eq!(data.edges.len(), 1);
		assert_eq!(data.edges[0].target, "b");
		assert_eq!(data.edges[0].weight, 2.0);
	}

	#[test]
	fn numeric_ids_and_src_dst_aliases() {
		let data = decode(json!({
			"nodes": [{ "id": 1, "label": "Node1" }, { "id": 2, "label": "Node2" }],
			"edges": [{ "src": 1, "dst": 2, "relation": "owns" }]
		}));
		assert_eq!(data.nodes[0].id, "1");
		assert_eq!(data.edges[0].source, "1");
		assert_eq!(data.edges[0].target, "2");
		assert_eq!(data.edges[0].relation.as_deref(), Some("owns"));
	}

	#[test]
	fn node_fields_default_and_type_is_renamed() {
		let data = decode(json!({
			"nodes": [
				{ "id": "e1", "label": "Entity 1", "kind": "entity", "type": "Org" },
				{ "id": "ev1", "kind": "event" }
			]
		}));
		assert_eq!(data.nodes[0].node_type.as_deref(), Some("Org"));
		assert_eq!(data.nodes[1].kind, NodeKind::Event);
		assert_eq!(data.nodes[1].label, None);
		assert!(data.edges.is_empty());
	}

	#[test]
	fn unknown_kind_is_a_decode_error() {
		let err = GraphData::from_json(r#"{"nodes":[{"id":"a","kind":"planet"}]}"#);
		assert!(err.is_err());
	}
}
