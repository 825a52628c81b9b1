use serde_json::Value;
use std::time::{Duration, Instant};
use story_graph::{DanglingDivert, GraphBuilder, StoryGraph};
use story_runtime::{is_valid_knot_name, DetectOptions, PositionDetector, StoryEngine};

/// Configuration for static validation of detected positions.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// How long a compiled graph stays authoritative
    pub cache_ttl: Duration,

    /// Turn membership validation off entirely (pass-through)
    pub enabled: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            enabled: true,
        }
    }
}

struct CachedStructure {
    graph: StoryGraph,
    dangling: Vec<DanglingDivert>,
    built_at: Instant,
}

/// A [`PositionDetector`] cross-checked against the static graph.
///
/// Detection results that name a knot absent from the compiled graph are
/// replaced through a fallback ladder. Validation fails open: with no
/// cached graph, or one older than the TTL, the wrapped detector's answer
/// passes through unchanged. Static validation is an enhancement, never a
/// gate that can stall playback.
pub struct ValidatedDetector {
    detector: PositionDetector,
    config: ValidatorConfig,
    cache: Option<CachedStructure>,
}

impl ValidatedDetector {
    pub fn new(detector: PositionDetector, config: ValidatorConfig) -> Self {
        Self {
            detector,
            config,
            cache: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PositionDetector::new(), ValidatorConfig::default())
    }

    pub fn detector(&self) -> &PositionDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut PositionDetector {
        &mut self.detector
    }

    /// Rebuild the cached graph from fresh bytecode and restart the TTL
    /// clock. Malformed bytecode caches an empty graph (and is logged by
    /// the builder).
    pub fn set_story_structure(&mut self, bytecode: &Value) {
        let outcome = GraphBuilder::build(bytecode);
        self.cache = Some(CachedStructure {
            graph: outcome.graph,
            dangling: outcome.dangling,
            built_at: Instant::now(),
        });
    }

    /// The cached graph, if a compiled story has been set
    pub fn structure(&self) -> Option<&StoryGraph> {
        self.cache.as_ref().map(|c| &c.graph)
    }

    /// Diverts dropped during the last build
    pub fn dangling_diverts(&self) -> &[DanglingDivert] {
        self.cache.as_ref().map_or(&[], |c| c.dangling.as_slice())
    }

    fn cache_is_fresh(&self) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| c.built_at.elapsed() < self.config.cache_ttl)
    }

    /// Detect the current knot and validate it against the static graph.
    pub fn current_knot<E: StoryEngine>(&mut self, engine: &E, fallback: Option<&str>) -> String {
        let raw = self.detector.current_knot(engine, fallback);
        self.validate(raw, fallback)
    }

    /// Detect the knot a committed choice leads to, validated. The current
    /// knot serves as the substitution fallback: staying put beats jumping
    /// to an unrelated knot.
    pub fn detect_after_choice<E: StoryEngine>(
        &mut self,
        engine: &mut E,
        current: &str,
        index: usize,
        options: &DetectOptions,
    ) -> String {
        let raw = self
            .detector
            .detect_after_choice(engine, current, index, options);
        self.validate(raw, Some(current))
    }

    fn validate(&self, raw: String, fallback: Option<&str>) -> String {
        if !self.config.enabled {
            return raw;
        }
        let Some(cache) = &self.cache else {
            return raw;
        };
        if cache.built_at.elapsed() >= self.config.cache_ttl {
            log::debug!("static structure cache is stale; passing '{raw}' through");
            return raw;
        }
        if cache.graph.contains(&raw) {
            return raw;
        }

        log::warn!("detected knot '{raw}' is not in the static graph; substituting");

        if let Some(name) = self.detector.last_known_knot() {
            if cache.graph.contains(name) {
                return name.to_string();
            }
        }
        if let Some(name) = fallback {
            if is_valid_knot_name(name) {
                return name.to_string();
            }
        }
        cache.graph.first_knot().unwrap_or(raw)
    }

    // Structural queries over the cached graph. These answer from whatever
    // structure exists, fresh or stale; only playback validation is
    // time-boxed.

    pub fn is_knot_reachable(&self, name: &str) -> bool {
        self.structure().is_some_and(|g| g.is_reachable(name))
    }

    pub fn is_dead_end(&self, name: &str) -> bool {
        self.structure().is_some_and(|g| g.is_dead_end(name))
    }

    pub fn knot_targets(&self, name: &str) -> Vec<String> {
        self.structure().map_or_else(Vec::new, |g| g.targets_of(name))
    }

    pub fn knot_sources(&self, name: &str) -> Vec<String> {
        self.structure().map_or_else(Vec::new, |g| g.sources_of(name))
    }

    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        self.structure()?.find_path(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use story_runtime::testing::ScriptedEngine;
    use story_runtime::EngineSnapshot;

    fn two_knot_story() -> Value {
        json!({"root": [{}, {"A": ["^go", {"->": "B"}], "B": ["^end"]}]})
    }

    #[test]
    fn member_of_static_graph_passes_through() {
        let mut validator = ValidatedDetector::with_defaults();
        validator.set_story_structure(&two_knot_story());

        let engine = ScriptedEngine::linear(&["A"]);
        assert_eq!(validator.current_knot(&engine, None), "A");
    }

    #[test]
    fn non_member_falls_back_to_first_static_knot() {
        let mut validator = ValidatedDetector::with_defaults();
        validator.set_story_structure(&two_knot_story());

        // No live signal at all: detector yields its sentinel, which is not
        // a member of the graph, and nothing better is known.
        let engine = ScriptedEngine::from_snapshots(vec![EngineSnapshot::empty()]);
        assert_eq!(validator.current_knot(&engine, None), "A");
    }

    #[test]
    fn non_member_prefers_last_known_member() {
        let mut validator = ValidatedDetector::with_defaults();
        validator.set_story_structure(&two_knot_story());

        let engine = ScriptedEngine::linear(&["B"]);
        assert_eq!(validator.current_knot(&engine, None), "B");

        // Signals drop out and the caller's hint names a knot the graph
        // does not know: the remembered member wins over the hint.
        let silent = ScriptedEngine::from_snapshots(vec![EngineSnapshot::empty()]);
        assert_eq!(validator.current_knot(&silent, Some("ghost")), "B");
    }

    #[test]
    fn caller_fallback_outranks_first_knot() {
        let mut validator = ValidatedDetector::with_defaults();
        validator.set_story_structure(&two_knot_story());

        let engine = ScriptedEngine::linear(&["elsewhere"]);
        assert_eq!(validator.current_knot(&engine, Some("B")), "B");
    }

    #[test]
    fn stale_cache_fails_open() {
        let config = ValidatorConfig {
            cache_ttl: Duration::ZERO,
            ..Default::default()
        };
        let mut validator = ValidatedDetector::new(PositionDetector::new(), config);
        validator.set_story_structure(&two_knot_story());

        let engine = ScriptedEngine::linear(&["elsewhere"]);
        assert_eq!(validator.current_knot(&engine, None), "elsewhere");
    }

    #[test]
    fn disabled_validation_passes_through() {
        let config = ValidatorConfig {
            enabled: false,
            ..Default::default()
        };
        let mut validator = ValidatedDetector::new(PositionDetector::new(), config);
        validator.set_story_structure(&two_knot_story());

        let engine = ScriptedEngine::linear(&["elsewhere"]);
        assert_eq!(validator.current_knot(&engine, None), "elsewhere");
    }

    #[test]
    fn no_structure_passes_through() {
        let mut validator = ValidatedDetector::with_defaults();
        let engine = ScriptedEngine::linear(&["elsewhere"]);
        assert_eq!(validator.current_knot(&engine, None), "elsewhere");
    }

    #[test]
    fn structural_queries_answer_from_cache() {
        let mut validator = ValidatedDetector::with_defaults();
        validator.set_story_structure(&two_knot_story());

        assert!(validator.is_knot_reachable("B"));
        assert!(validator.is_dead_end("B"));
        assert!(!validator.is_dead_end("A"));
        assert_eq!(validator.knot_targets("A"), vec!["B"]);
        assert_eq!(validator.knot_sources("B"), vec!["A"]);
        assert_eq!(
            validator.find_path("A", "B"),
            Some(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn queries_without_structure_degrade_to_defaults() {
        let validator = ValidatedDetector::with_defaults();
        assert!(!validator.is_knot_reachable("A"));
        assert!(!validator.is_dead_end("A"));
        assert!(validator.knot_targets("A").is_empty());
        assert!(validator.find_path("A", "B").is_none());
    }

    #[test]
    fn recompile_replaces_structure() {
        let mut validator = ValidatedDetector::with_defaults();
        validator.set_story_structure(&two_knot_story());
        validator.set_story_structure(&json!({"root": [{"C": []}]}));

        let engine = ScriptedEngine::from_snapshots(vec![EngineSnapshot::empty()]);
        assert_eq!(validator.current_knot(&engine, None), "C");
    }
}
