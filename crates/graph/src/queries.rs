use crate::types::StoryGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

impl StoryGraph {
    /// Knots this knot diverts to, deduplicated, in traversal order
    pub fn targets_of(&self, name: &str) -> Vec<String> {
        let Some(idx) = self.find_knot(name) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.graph
            .edge_references()
            .filter(|e| e.source() == idx)
            .filter_map(|e| self.graph.node_weight(e.target()).map(|n| n.id.clone()))
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Knots that divert into this knot, deduplicated, in traversal order
    pub fn sources_of(&self, name: &str) -> Vec<String> {
        let Some(idx) = self.find_knot(name) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.graph
            .edge_references()
            .filter(|e| e.target() == idx)
            .filter_map(|e| self.graph.node_weight(e.source()).map(|n| n.id.clone()))
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// A knot with no outgoing transitions
    pub fn is_dead_end(&self, name: &str) -> bool {
        match self.find_knot(name) {
            Some(idx) => self.graph.edges(idx).next().is_none(),
            None => false,
        }
    }

    /// Knots with no incoming transitions, in bytecode order
    pub fn entry_points(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.id.clone()))
            .collect()
    }

    /// Names reachable by forward traversal from the entry points.
    ///
    /// When the graph is fully cyclic (no entry points) the first knot in
    /// bytecode order seeds the traversal instead.
    pub fn reachable_set(&self) -> HashSet<String> {
        let mut starts: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        if starts.is_empty() {
            starts.extend(self.graph.node_indices().next());
        }

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = starts.into_iter().collect();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for edge in self.graph.edges(current) {
                if !visited.contains(&edge.target()) {
                    queue.push_back(edge.target());
                }
            }
        }

        visited
            .into_iter()
            .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.id.clone()))
            .collect()
    }

    pub fn is_reachable(&self, name: &str) -> bool {
        self.contains(name) && self.reachable_set().contains(name)
    }

    /// Breadth-first shortest path between two knots, endpoints included
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let start = self.find_knot(from)?;
        let goal = self.find_knot(to)?;

        if start == goal {
            return Some(vec![from.to_string()]);
        }

        let mut predecessor: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for edge in self.graph.edges(current) {
                let next = edge.target();
                if !visited.insert(next) {
                    continue;
                }
                predecessor.insert(next, current);
                if next == goal {
                    let mut path = vec![goal];
                    let mut cursor = goal;
                    while let Some(&prev) = predecessor.get(&cursor) {
                        path.push(prev);
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(
                        path.into_iter()
                            .filter_map(|idx| {
                                self.graph.node_weight(idx).map(|n| n.id.clone())
                            })
                            .collect(),
                    );
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// Average outgoing transitions per knot (0.0 for an empty graph)
    pub fn average_branching_factor(&self) -> f64 {
        let knots = self.graph.node_count();
        if knots == 0 {
            return 0.0;
        }
        self.graph.edge_count() as f64 / knots as f64
    }
}
