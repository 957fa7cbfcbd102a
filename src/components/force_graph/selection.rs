use std::collections::HashSet;

use super::snapshot::{GraphNode, GraphSnapshot};
use super::types::NodeKind;

/// Which node, if any, the inspector is showing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionModel {
	#[default]
	Closed,
	Open(String),
}

impl SelectionModel {
	pub fn selected(&self) -> Option<&str> {
		match self {
			SelectionModel::Closed => None,
			SelectionModel::Open(id) => Some(id.as_str()),
		}
	}

	pub fn is_open(&self) -> bool {
		matches!(self, SelectionModel::Open(_))
	}

	/// Opens the inspector on `id`. Clicking the node already open is a no-op.
	pub fn click_node(&mut self, id: &str) {
		if self.selected() != Some(id) {
			*self = SelectionModel::Open(id.to_owned());
		}
	}

	/// Escape, click outside, or the close button.
	pub fn dismiss(&mut self) {
		*self = SelectionModel::Closed;
	}

	/// Closes the selection when its node is not part of `snapshot`. Returns true
	/// if the selection changed.
	pub fn reconcile(&mut self, snapshot: &GraphSnapshot) -> bool {
		let stale = self.selected().is_some_and(|id| !snapshot.contains(id));
		if stale {
			self.dismiss();
		}
		stale
	}
}

/// Nodes sharing an edge with `selected`, in edge order, each listed once.
pub fn related_nodes<'a>(snapshot: &'a GraphSnapshot, selected: Option<&str>) -> Vec<&'a GraphNode> {
	related_edges(snapshot, selected)
		.into_iter()
		.map(|(node, _)| node)
		.collect()
}

/// Like `related_nodes`, paired with the relation label of the first edge that
/// reached each neighbour.
fn related_edges<'a>(
	snapshot: &'a GraphSnapshot,
	selected: Option<&str>,
) -> Vec<(&'a GraphNode, Option<&'a str>)> {
	let Some(id) = selected.filter(|id| snapshot.contains(id)) else {
		return Vec::new();
	};

	let mut seen = HashSet::new();
	snapshot
		.edges()
		.iter()
		.filter_map(|edge| {
			let other = edge.other_end(id).filter(|other| *other != id)?;
			if !seen.insert(other) {
				return None;
			}
			Some((snapshot.node(other)?, edge.relation.as_deref()))
		})
		.collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelatedNode {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
	pub relation: Option<String>,
}

/// Everything the inspector panel shows for one open selection.
#[derive(Clone, Debug, PartialEq)]
pub struct InspectorView {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
	pub node_type: Option<String>,
	pub related: Vec<RelatedNode>,
}

impl InspectorView {
	pub fn build(snapshot: &GraphSnapshot, selection: &SelectionModel) -> Option<Self> {
		let node = snapshot.node(selection.selected()?)?;
		let related = related_edges(snapshot, Some(node.id.as_str()))
			.into_iter()
			.map(|(n, relation)| RelatedNode {
				id: n.id.clone(),
				label: n.label.clone(),
				kind: n.kind,
				relation: relation.map(str::to_owned),
			})
			.collect();
		Some(Self {
			id: node.id.clone(),
			label: node.label.clone(),
			kind: node.kind,
			node_type: node.node_type.clone(),
			related,
		})
	}
}
