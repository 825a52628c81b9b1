use crate::bytecode::{
    choice_branch_key, is_reserved_key, named_content, CHOICE_REF_KEY, DIVERT_KEY, TEXT_PREFIX,
};
use crate::types::{DanglingDivert, FlowEdge, FlowKind, KnotNode, StoryGraph};
use serde_json::{Map, Value};

/// Label used when no text fragment preceded a divert
const EMPTY_LABEL: &str = "...";

/// Result of a graph build: the graph plus the diverts that were dropped
/// because their target did not resolve.
pub struct BuildOutcome {
    pub graph: StoryGraph,
    pub dangling: Vec<DanglingDivert>,
}

/// Build a knot-flow graph from compiled story bytecode
pub struct GraphBuilder;

impl GraphBuilder {
    /// Build the graph. Never fails: structurally invalid input yields an
    /// empty graph and a logged diagnostic.
    pub fn build(bytecode: &Value) -> BuildOutcome {
        let mut graph = StoryGraph::new();
        let mut dangling = Vec::new();

        let Some(named) = named_content(bytecode) else {
            log::warn!("compiled story has no named-content map; returning empty graph");
            return BuildOutcome { graph, dangling };
        };

        // Phase 1: one node per author-named knot
        for name in named.keys() {
            if !is_reserved_key(name) {
                graph.add_knot(KnotNode { id: name.clone() });
            }
        }

        // Phase 2: traverse each knot body for transitions
        for (name, body) in named {
            if is_reserved_key(name) {
                continue;
            }

            let Some(items) = body.as_array() else {
                log::warn!("knot '{name}' body is not an array; skipping");
                continue;
            };

            let mut walk = BodyWalk::new(name, named);
            walk.descend(items, false);

            let Some(from) = graph.find_knot(name) else {
                continue;
            };
            for pending in walk.edges {
                if let Some(to) = graph.find_knot(&pending.target) {
                    graph.add_flow(
                        from,
                        to,
                        FlowEdge {
                            label: pending.label,
                            kind: pending.kind,
                        },
                    );
                }
            }
            dangling.extend(walk.dangling);
        }

        for divert in &dangling {
            log::warn!(
                "dropping dangling divert {} -> {} (target is not a named knot)",
                divert.source,
                divert.target
            );
        }

        log::info!(
            "built story graph: {} knots, {} links, {} dangling diverts",
            graph.knot_count(),
            graph.link_count(),
            dangling.len()
        );

        BuildOutcome { graph, dangling }
    }
}

struct PendingEdge {
    target: String,
    label: String,
    kind: FlowKind,
}

/// Recursive traversal state for a single knot body.
///
/// `last_text` follows the traversal across nested containers; it is only
/// reset when a new knot body starts. `main_line_taken` enforces the
/// one-non-choice-edge-per-knot rule; choice edges are never suppressed.
struct BodyWalk<'a> {
    knot: &'a str,
    named: &'a Map<String, Value>,
    last_text: Option<String>,
    main_line_taken: bool,
    edges: Vec<PendingEdge>,
    dangling: Vec<DanglingDivert>,
}

impl<'a> BodyWalk<'a> {
    fn new(knot: &'a str, named: &'a Map<String, Value>) -> Self {
        Self {
            knot,
            named,
            last_text: None,
            main_line_taken: false,
            edges: Vec::new(),
            dangling: Vec::new(),
        }
    }

    fn descend(&mut self, items: &[Value], in_choice: bool) {
        for item in items {
            match item {
                Value::String(s) => {
                    if let Some(text) = s.strip_prefix(TEXT_PREFIX) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            self.last_text = Some(trimmed.to_string());
                        }
                    }
                }
                Value::Array(nested) => self.descend(nested, in_choice),
                Value::Object(obj) => self.visit_object(obj, in_choice),
                _ => {}
            }
        }
    }

    fn visit_object(&mut self, obj: &Map<String, Value>, in_choice: bool) {
        if let Some(Value::String(target)) = obj.get(DIVERT_KEY) {
            self.record_divert(target, in_choice);
        }

        // A choice marker references its branch body through a dotted path;
        // the branch itself sits under the sibling `c-<n>` key.
        let branch = obj
            .get(CHOICE_REF_KEY)
            .and_then(Value::as_str)
            .and_then(choice_branch_key);
        if let Some(branch_key) = branch {
            if let Some(Value::Array(body)) = obj.get(branch_key) {
                self.descend(body, true);
            }
        }

        // Diverts and choices can hide arbitrarily deep inside conditional
        // and logic containers, so every other array value is traversed too.
        for (key, value) in obj {
            if Some(key.as_str()) == branch {
                continue;
            }
            if let Value::Array(nested) = value {
                self.descend(nested, in_choice);
            }
        }
    }

    fn record_divert(&mut self, target: &str, in_choice: bool) {
        let Some(resolved) = self.resolve_target(target) else {
            self.dangling.push(DanglingDivert {
                source: self.knot.to_string(),
                target: target.to_string(),
            });
            return;
        };

        let kind = if in_choice {
            FlowKind::Choice
        } else {
            if self.main_line_taken {
                return;
            }
            self.main_line_taken = true;
            FlowKind::Divert
        };

        let label = self
            .last_text
            .clone()
            .unwrap_or_else(|| EMPTY_LABEL.to_string());

        self.edges.push(PendingEdge {
            target: resolved,
            label,
            kind,
        });
    }

    /// Resolve a divert target against the named-content map.
    ///
    /// Diverts may address a stitch inside a knot (`knot.stitch`); the knot
    /// segment is the graph-level target.
    fn resolve_target(&self, target: &str) -> Option<String> {
        if self.named.contains_key(target) && !is_reserved_key(target) {
            return Some(target.to_string());
        }
        let head = target.split('.').next()?;
        if head != target && self.named.contains_key(head) && !is_reserved_key(head) {
            return Some(head.to_string());
        }
        None
    }
}
