//! Node and edge collections the relation engine works over.
//!
//! [`NodeSet`] is never mutated in place by the engine. Every relation
//! operation starts a [`StagedNodes`] from a set, edits its private copy and
//! hands back the new set together with the ids of the nodes that changed.

use crate::domain::edge::Edge;
use crate::domain::node::{Node, NodeData, NodeId};
use std::collections::HashSet;

/// Ordered node collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Wrap a node list
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Find a node by ID
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Whether a node with this ID exists
    pub fn contains(&self, id: &NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// New set with `node` inserted, replacing any node with the same ID
    pub fn with_node(&self, node: Node) -> Self {
        let mut next = self.clone();
        next.upsert(node);
        next
    }

    /// New set without the node
    pub fn without_node(&self, id: &NodeId) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|node| &node.id != id)
                .cloned()
                .collect(),
        }
    }

    /// Name to show for a node: its custom name, else its id.
    /// Unknown ids are shown as-is.
    pub fn display_name(&self, id: &NodeId) -> String {
        self.get(id)
            .map(Node::display_name)
            .unwrap_or_else(|| id.0.clone())
    }

    /// Next free numeric node ID: one past the highest numeric ID, "0" when empty
    pub fn next_id(&self) -> NodeId {
        let next = self
            .nodes
            .iter()
            .filter_map(|node| node.id.0.parse::<u64>().ok())
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        NodeId(next.to_string())
    }

    /// Consume the set
    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    fn upsert(&mut self, node: Node) {
        match self.nodes.iter_mut().find(|existing| existing.id == node.id) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
    }

    fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| &node.id == id)
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Working copy of a node set with change tracking
#[derive(Debug, Clone)]
pub struct StagedNodes {
    nodes: NodeSet,
    touched: Vec<NodeId>,
}

impl StagedNodes {
    /// Start staging from `nodes`; the original set is left untouched
    pub fn new(nodes: &NodeSet) -> Self {
        Self {
            nodes: nodes.clone(),
            touched: Vec::new(),
        }
    }

    /// Current staged state
    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    /// Ids of nodes whose payload changed, in first-change order
    pub fn touched(&self) -> &[NodeId] {
        &self.touched
    }

    /// Whether anything changed
    pub fn is_unchanged(&self) -> bool {
        self.touched.is_empty()
    }

    /// Edit a node's payload. Returns `false` when the node does not exist.
    pub fn update<F>(&mut self, id: &NodeId, edit: F) -> bool
    where
        F: FnOnce(&mut NodeData),
    {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };

        let before = node.data.clone();
        edit(&mut node.data);

        if node.data != before && !self.touched.contains(id) {
            self.touched.push(id.clone());
        }
        true
    }

    /// Drop a node from the staged set
    pub fn remove(&mut self, id: &NodeId) {
        self.nodes = self.nodes.without_node(id);
        self.touched.retain(|touched| touched != id);
    }

    /// Staged copies of every changed node
    pub fn changed(&self) -> Vec<Node> {
        self.touched
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect()
    }

    /// Finish staging and return the new set
    pub fn into_nodes(self) -> NodeSet {
        self.nodes
    }
}

/// Edges present in exactly one of the two lists, compared by ID
pub fn edge_difference(before: &[Edge], after: &[Edge]) -> Vec<Edge> {
    let before_ids: HashSet<_> = before.iter().map(|edge| &edge.id).collect();
    let after_ids: HashSet<_> = after.iter().map(|edge| &edge.id).collect();

    before
        .iter()
        .filter(|edge| !after_ids.contains(&edge.id))
        .chain(after.iter().filter(|edge| !before_ids.contains(&edge.id)))
        .cloned()
        .collect()
}

/// Edges of `before` that are missing from `after`
pub fn removed_edges(before: &[Edge], after: &[Edge]) -> Vec<Edge> {
    let before_ids: HashSet<_> = before.iter().map(|edge| &edge.id).collect();
    edge_difference(before, after)
        .into_iter()
        .filter(|edge| before_ids.contains(&edge.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::{EdgeData, EdgeId, EdgeType};
    use crate::domain::handle::HandleId;
    use crate::domain::node::{Aspect, NodeType};
    use crate::domain::relation::CollectionField;

    fn block(id: &str) -> Node {
        Node::new(NodeId::from(id), NodeType::Block, Aspect::Function)
    }

    fn edge(id: &str) -> Edge {
        Edge {
            id: EdgeId::from(id),
            edge_type: EdgeType::Connected,
            source: NodeId::from("0"),
            target: NodeId::from("1"),
            source_handle: HandleId::from("block-r"),
            target_handle: HandleId::from("block-l"),
            data: EdgeData::default(),
        }
    }

    #[test]
    fn test_next_id() {
        assert_eq!(NodeSet::default().next_id(), NodeId::from("0"));

        let nodes: NodeSet = vec![block("0"), block("7"), block("note")].into_iter().collect();
        assert_eq!(nodes.next_id(), NodeId::from("8"));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut named = block("1");
        named.data.custom_name = Some("Pump".to_string());
        let nodes = NodeSet::new(vec![named, block("2")]);

        assert_eq!(nodes.display_name(&NodeId::from("1")), "Pump");
        assert_eq!(nodes.display_name(&NodeId::from("2")), "2");
        assert_eq!(nodes.display_name(&NodeId::from("9")), "9");
    }

    #[test]
    fn test_with_node_leaves_original() {
        let nodes = NodeSet::new(vec![block("0")]);
        let mut replacement = block("0");
        replacement.data.label = "renamed".to_string();

        let next = nodes.with_node(replacement).with_node(block("1"));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.get(&NodeId::from("0")).unwrap().data.label, "block_0");
        assert_eq!(next.len(), 2);
        assert_eq!(next.get(&NodeId::from("0")).unwrap().data.label, "renamed");
    }

    #[test]
    fn test_staging_tracks_only_real_changes() {
        let nodes = NodeSet::new(vec![block("0"), block("1")]);
        let mut staged = StagedNodes::new(&nodes);

        assert!(staged.update(&NodeId::from("0"), |data| {
            data.append(CollectionField::Children, NodeId::from("1"));
        }));
        assert!(staged.update(&NodeId::from("1"), |_| {}));
        assert!(!staged.update(&NodeId::from("5"), |_| {}));

        assert_eq!(staged.touched(), &[NodeId::from("0")]);
        assert_eq!(staged.changed().len(), 1);
        assert!(nodes.get(&NodeId::from("0")).unwrap().data.children.is_empty());
    }

    #[test]
    fn test_removed_edges() {
        let before = vec![edge("a"), edge("b"), edge("c")];
        let after = vec![edge("a"), edge("c"), edge("d")];

        let difference: Vec<_> = edge_difference(&before, &after)
            .into_iter()
            .map(|edge| edge.id.0)
            .collect();
        assert_eq!(difference, vec!["b".to_string(), "d".to_string()]);

        let removed = removed_edges(&before, &after);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, EdgeId::from("b"));
    }
}
