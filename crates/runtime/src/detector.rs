use crate::engine::{EngineError, EngineSnapshot, StoryEngine};
use crate::flow::KnotFlowMap;
use crate::heuristics::resolve_position;
use crate::names::is_valid_knot_name;
use crate::rollback::RollbackGuard;

/// Unconditional last-resort position
pub const START_KNOT: &str = "start";

/// Options for choice detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectOptions {
    /// Speculatively step the engine to check the prediction, rolling the
    /// engine back afterwards
    pub verify_after_continue: bool,
}

/// Infers the knot currently executing in a live story engine.
///
/// Stateless per call except for `last_known`: the detector's memory of
/// the most recent validated position, which anchors detection when every
/// live signal drops out. One detector per story session; concurrent
/// sessions need their own instances.
#[derive(Debug, Default)]
pub struct PositionDetector {
    flow_map: KnotFlowMap,
    last_known: Option<String>,
}

impl PositionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with a story-supplied transition table
    pub fn with_flow_map(flow_map: KnotFlowMap) -> Self {
        Self {
            flow_map,
            last_known: None,
        }
    }

    /// Replace the transition table (regenerated after each compile)
    pub fn set_flow_map(&mut self, flow_map: KnotFlowMap) {
        self.flow_map = flow_map;
    }

    pub fn flow_map(&self) -> &KnotFlowMap {
        &self.flow_map
    }

    pub fn last_known_knot(&self) -> Option<&str> {
        self.last_known.as_deref()
    }

    /// Record a validated position; invalid names are ignored
    pub fn set_last_known_knot(&mut self, name: &str) {
        if is_valid_knot_name(name) {
            self.last_known = Some(name.to_string());
        }
    }

    /// Name the knot the engine is currently positioned in.
    ///
    /// Falls through live signals, then the caller's `fallback`, then the
    /// detector's own memory, then [`START_KNOT`]. Never fails.
    pub fn current_knot<E: StoryEngine>(&mut self, engine: &E, fallback: Option<&str>) -> String {
        let snapshot = engine.snapshot();
        self.resolve(&snapshot, fallback)
    }

    /// Detection over an already-captured snapshot.
    pub fn resolve(&mut self, snapshot: &EngineSnapshot, fallback: Option<&str>) -> String {
        if let Some(knot) = resolve_position(snapshot) {
            self.last_known = Some(knot.clone());
            return knot;
        }

        if let Some(name) = fallback {
            if is_valid_knot_name(name) {
                return name.to_string();
            }
        }

        if let Some(name) = &self.last_known {
            if is_valid_knot_name(name) {
                return name.clone();
            }
        }

        START_KNOT.to_string()
    }

    /// Predicted landing knot for taking choice `index` while in `current`.
    ///
    /// No table entry or no matching target means "no transition": the
    /// current knot is returned unchanged.
    pub fn predict_target(&self, current: &str, index: usize) -> String {
        match self.flow_map.get(current) {
            Some(flow) => flow
                .choices
                .get(index)
                .cloned()
                .or_else(|| flow.default_target.clone())
                .unwrap_or_else(|| current.to_string()),
            None => current.to_string(),
        }
    }

    /// Name the knot choice `index` leads to, optionally verifying the
    /// prediction by speculatively stepping the engine.
    ///
    /// Verification always rolls the engine back; when it observes a
    /// different, valid knot than predicted, the observation wins and is
    /// recorded as the last known position.
    pub fn detect_after_choice<E: StoryEngine>(
        &mut self,
        engine: &mut E,
        current: &str,
        index: usize,
        options: &DetectOptions,
    ) -> String {
        let predicted = self.predict_target(current, index);

        if options.verify_after_continue && engine.can_continue() {
            match self.verify_prediction(engine, index, &predicted) {
                Ok(observed) => {
                    if observed != predicted && is_valid_knot_name(&observed) {
                        log::debug!(
                            "speculative step contradicts prediction: {predicted} -> {observed}"
                        );
                        self.last_known = Some(observed.clone());
                        return observed;
                    }
                }
                Err(err) => {
                    log::debug!("speculative verification failed, keeping prediction: {err}");
                }
            }
        }

        predicted
    }

    /// Step once under a rollback guard and re-run detection with the
    /// prediction as fallback. The guard restores the engine on every
    /// exit path.
    fn verify_prediction<E: StoryEngine>(
        &mut self,
        engine: &mut E,
        index: usize,
        predicted: &str,
    ) -> Result<String, EngineError> {
        let mut guard = RollbackGuard::acquire(engine)?;
        guard.engine().choose_choice(index)?;
        guard.engine().continue_story()?;
        let snapshot = guard.engine().snapshot();
        Ok(self.resolve(&snapshot, Some(predicted)))
    }
}
