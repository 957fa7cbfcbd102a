use std::collections::HashMap;

use log::{info, warn};

use super::types::{GraphData, NodeKind};

/// Static attributes of one node. Kinematics live in the simulation engine.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
	pub node_type: Option<String>,
}

/// An edge between two node ids. Endpoints are never rewritten into references.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	pub weight: f64,
	pub relation: Option<String>,
}

impl GraphEdge {
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}

	/// The endpoint opposite `id`, if this edge touches `id`.
	pub fn other_end(&self, id: &str) -> Option<&str> {
		if self.source == id {
			Some(&self.target)
		} else if self.target == id {
			Some(&self.source)
		} else {
			None
		}
	}
}

/// One validated fetch result. Node ids are unique and every edge resolves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	index: HashMap<String, usize>,
}

impl GraphSnapshot {
	pub fn from_data(data: GraphData) -> Self {
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut index = HashMap::with_capacity(data.nodes.len());
		let mut duplicate_nodes = 0usize;

		for record in data.nodes {
			if index.contains_key(&record.id) {
				duplicate_nodes += 1;
				continue;
			}
			index.insert(record.id.clone(), nodes.len());
			nodes.push(GraphNode {
				label: record.label.unwrap_or_else(|| record.id.clone()),
				id: record.id,
				kind: record.kind,
				node_type: record.node_type,
			});
		}

		let total_edges = data.edges.len();
		let edges: Vec<GraphEdge> = data
			.edges
			.into_iter()
			.filter(|e| index.contains_key(&e.source) && index.contains_key(&e.target))
			.map(|e| GraphEdge {
				source: e.source,
				target: e.target,
				weight: if e.weight.is_finite() { e.weight.max(0.0) } else { 0.0 },
				relation: e.relation,
			})
			.collect();

		let dangling = total_edges - edges.len();
		if dangling > 0 || duplicate_nodes > 0 {
			warn!(
				"graph snapshot: dropped {} dangling edge(s) and {} duplicate node(s)",
				dangling, duplicate_nodes
			);
		}
		info!(
			"graph snapshot loaded: {} nodes, {} edges",
			nodes.len(),
			edges.len()
		);

		Self {
			nodes,
			edges,
			index,
		}
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index_of(id).map(|idx| &self.nodes[idx])
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Endpoint indices of `edge`. Always resolves for edges held by this snapshot.
	pub(super) fn endpoints(&self, edge: &GraphEdge) -> Option<(usize, usize)> {
		Some((self.index_of(&edge.source)?, self.index_of(&edge.target)?))
	}
}

#[cfg(test)]
pub(super) mod fixtures {
	use super::*;
	use crate::components::force_graph::types::{EdgeRecord, NodeRecord};

	pub fn node(id: &str) -> NodeRecord {
		NodeRecord {
			id: id.into(),
			label: None,
			kind: NodeKind::Entity,
			node_type: None,
		}
	}

	pub fn edge(source: &str, target: &str, weight: f64) -> EdgeRecord {
		EdgeRecord {
			source: source.into(),
			target: target.into(),
			weight,
			relation: None,
		}
	}

	pub fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
		GraphSnapshot::from_data(GraphData {
			nodes: ids.iter().map(|id| node(id)).collect(),
			edges: edges.iter().map(|(s, t)| edge(s, t, 1.0)).collect(),
		})
	}
}
