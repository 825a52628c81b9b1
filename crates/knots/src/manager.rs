use crate::integrity::{validate_structure, IntegrityReport};
use crate::scanner::{ScannedDecl, ScannedSource, ScannerConfig, SourceScanner};
use crate::search::search_knot_names;
use crate::validator::{ValidatedDetector, ValidatorConfig};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use story_graph::{FlowKind, GraphSnapshot, StoryGraph};
use story_runtime::{DetectOptions, KnotFlowMap, PositionDetector, StoryEngine};

/// Configuration for the unified manager.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    pub scanner: ScannerConfig,
    pub validator: ValidatorConfig,

    /// Speculatively verify choice predictions against the live engine
    pub verify_predictions: bool,
}

/// Resolved identity of one knot, merged from source-scan provenance and
/// compiled-graph structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnotInfo {
    pub name: String,
    pub file_path: Option<String>,
    pub line_number: Option<usize>,
    pub is_current: Option<bool>,
    pub is_reachable: Option<bool>,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

/// Counts from the last compiled-story update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub knots: usize,
    pub links: usize,
    pub dangling: usize,
}

/// Façade over the static graph, the runtime detector, and the source
/// scanner. This is the only component that sees both the static and the
/// live stream at once.
pub struct UnifiedKnotManager {
    validator: ValidatedDetector,
    scanner: SourceScanner,
    sources: BTreeMap<String, ScannedSource>,
    verify_predictions: bool,
}

impl UnifiedKnotManager {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            validator: ValidatedDetector::new(PositionDetector::new(), config.validator),
            scanner: SourceScanner::new(config.scanner),
            sources: BTreeMap::new(),
            verify_predictions: config.verify_predictions,
        }
    }

    /// Register (or refresh) a script source file.
    pub fn add_source_file(&mut self, path: &str, content: &str) -> ScannedSource {
        let scan = self.scanner.scan(path, content);
        self.sources.insert(path.to_string(), scan.clone());
        scan
    }

    /// Install freshly compiled bytecode: rebuilds the static graph and
    /// regenerates the detector's transition table from its real edges,
    /// superseding whatever table came before.
    pub fn set_compiled_story(&mut self, bytecode: &Value) -> StructureSummary {
        self.validator.set_story_structure(bytecode);

        let mut summary = StructureSummary {
            dangling: self.validator.dangling_diverts().len(),
            ..Default::default()
        };

        if let Some(graph) = self.validator.structure() {
            summary.knots = graph.knot_count();
            summary.links = graph.link_count();
            let flow_map = flow_map_from_graph(graph);
            self.validator.detector_mut().set_flow_map(flow_map);
        }

        log::info!(
            "compiled story installed: {} knots, {} links, {} dangling diverts",
            summary.knots,
            summary.links,
            summary.dangling
        );
        summary
    }

    /// All known knot names: compiled graph first (bytecode order), then
    /// names only the source scan knows about.
    pub fn all_knots(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .validator
            .structure()
            .map(StoryGraph::knot_ids)
            .unwrap_or_default();

        for scan in self.sources.values() {
            for knot in &scan.knots {
                if !names.contains(&knot.name) {
                    names.push(knot.name.clone());
                }
            }
        }
        names
    }

    /// Knot declarations scanned from one file
    pub fn knots_in_file(&self, path: &str) -> Vec<ScannedDecl> {
        self.sources
            .get(path)
            .map(|scan| scan.knots.clone())
            .unwrap_or_default()
    }

    /// Merged identity for one knot; `None` when neither the compiled
    /// graph nor any scanned source knows the name.
    pub fn knot_info(&self, name: &str) -> Option<KnotInfo> {
        let provenance = self.sources.iter().find_map(|(path, scan)| {
            scan.knots
                .iter()
                .find(|k| k.name == name)
                .map(|k| (path.clone(), k.line))
        });

        let in_graph = self
            .validator
            .structure()
            .is_some_and(|g| g.contains(name));
        if provenance.is_none() && !in_graph {
            return None;
        }

        let (file_path, line_number) = match provenance {
            Some((path, line)) => (Some(path), Some(line)),
            None => (None, None),
        };

        let is_current = self
            .validator
            .detector()
            .last_known_knot()
            .map(|last| last == name);

        Some(KnotInfo {
            name: name.to_string(),
            file_path,
            line_number,
            is_current,
            is_reachable: in_graph.then(|| self.validator.is_knot_reachable(name)),
            sources: self.validator.knot_sources(name),
            targets: self.validator.knot_targets(name),
        })
    }

    /// Current position in the live engine, validated against the static
    /// graph when one is cached.
    pub fn current_knot<E: StoryEngine>(&mut self, engine: &E) -> String {
        self.validator.current_knot(engine, None)
    }

    /// Landing knot for taking choice `index` while in `current`.
    pub fn predict_knot_after_choice<E: StoryEngine>(
        &mut self,
        engine: &mut E,
        current: &str,
        index: usize,
    ) -> String {
        let options = DetectOptions {
            verify_after_continue: self.verify_predictions,
        };
        self.validator
            .detect_after_choice(engine, current, index, &options)
    }

    /// Ranked name search over the combined view. The compiled graph is
    /// the preferred universe; source-scanned names fill in before the
    /// first successful compile.
    pub fn search_knots(&self, query: &str) -> Vec<String> {
        match self.validator.structure() {
            Some(graph) => {
                let ids = graph.knot_ids();
                search_knot_names(ids.iter().map(String::as_str), query)
            }
            None => {
                let names: Vec<&str> = self
                    .sources
                    .values()
                    .flat_map(|scan| scan.knots.iter().map(|k| k.name.as_str()))
                    .collect();
                search_knot_names(names, query)
            }
        }
    }

    /// The `{ nodes, links }` snapshot of the cached graph (empty before
    /// the first compile).
    pub fn story_structure(&self) -> GraphSnapshot {
        self.validator
            .structure()
            .map(StoryGraph::snapshot)
            .unwrap_or_default()
    }

    /// Structural diagnostics over the cached graph.
    pub fn validate_story_integrity(&self) -> IntegrityReport {
        validate_structure(self.validator.structure(), self.validator.dangling_diverts())
    }

    pub fn validator(&self) -> &ValidatedDetector {
        &self.validator
    }
}

impl Default for UnifiedKnotManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn the graph's real edges into a transition table: a knot's outgoing
/// edges, in traversal order, become its choices; its main-line divert
/// becomes the out-of-range default.
fn flow_map_from_graph(graph: &StoryGraph) -> KnotFlowMap {
    let mut map = KnotFlowMap::new();
    for (source, target, edge) in graph.flows() {
        let flow = map.entry(source).or_default();
        if edge.kind == FlowKind::Divert && flow.default_target.is_none() {
            flow.default_target = Some(target.clone());
        }
        flow.choices.push(target);
    }
    map
}
