use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A top-level author-named knot in the compiled story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnotNode {
    /// Knot name as it appears in the named-content map
    pub id: String,
}

/// Kind of flow transition between knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    /// Divert on the knot's main line (at most one per source knot)
    Divert,

    /// Divert taken from inside a choice branch
    Choice,
}

/// Edge payload stored in the graph; endpoints live on the graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    /// Most recent preceding text fragment, trimmed ("..." when none)
    pub label: String,

    pub kind: FlowKind,
}

/// Serialized transition as consumed by the visualization layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// A divert whose target did not resolve to any named knot.
///
/// The edge is dropped from the graph; the drop is surfaced here so callers
/// can report it instead of losing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingDivert {
    pub source: String,
    pub target: String,
}

/// Wire-shape snapshot of the whole graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<KnotNode>,
    pub links: Vec<FlowLink>,
}

/// Knot-flow graph with a name lookup index.
pub struct StoryGraph {
    /// Directed graph (knot -> knot with labeled transitions)
    pub graph: DiGraph<KnotNode, FlowEdge>,

    /// Knot name -> NodeIndex mapping for fast lookup
    pub name_index: HashMap<String, NodeIndex>,
}

impl StoryGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_index: HashMap::new(),
        }
    }

    /// Add a knot to the graph
    pub fn add_knot(&mut self, node: KnotNode) -> NodeIndex {
        let name = node.id.clone();
        let idx = self.graph.add_node(node);
        self.name_index.insert(name, idx);
        idx
    }

    /// Add a flow edge between two knots
    pub fn add_flow(&mut self, from: NodeIndex, to: NodeIndex, edge: FlowEdge) {
        self.graph.add_edge(from, to, edge);
    }

    /// Find a knot by name
    pub fn find_knot(&self, name: &str) -> Option<NodeIndex> {
        self.name_index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Knot ids in insertion order (the order they appear in the bytecode)
    pub fn knot_ids(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.id.clone()))
            .collect()
    }

    /// First knot id in bytecode order, if any
    pub fn first_knot(&self) -> Option<String> {
        self.graph
            .node_indices()
            .next()
            .and_then(|idx| self.graph.node_weight(idx).map(|n| n.id.clone()))
    }

    pub fn knot_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Snapshot in the `{ nodes, links }` wire shape.
    ///
    /// Links are emitted in insertion order, which is body-traversal order.
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect();

        let links = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?.id.clone();
                let target = self.graph.node_weight(edge.target())?.id.clone();
                Some(FlowLink {
                    source,
                    target,
                    label: edge.weight().label.clone(),
                })
            })
            .collect();

        GraphSnapshot { nodes, links }
    }

    /// All edges in insertion order as `(source, target, edge)` triples.
    pub fn flows(&self) -> Vec<(String, String, FlowEdge)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?.id.clone();
                let target = self.graph.node_weight(edge.target())?.id.clone();
                Some((source, target, edge.weight().clone()))
            })
            .collect()
    }
}

impl Default for StoryGraph {
    fn default() -> Self {
        Self::new()
    }
}
