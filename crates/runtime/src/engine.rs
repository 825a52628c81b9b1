use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures at the engine boundary.
///
/// Everything behind [`StoryEngine`] is an external scripting runtime whose
/// calls can refuse or fail; the detector treats all of these as "no
/// signal" and never propagates them.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine cannot advance: {0}")]
    Advance(String),

    #[error("invalid choice index {0}")]
    InvalidChoice(usize),

    #[error("engine state serialization failed: {0}")]
    State(String),
}

/// One execution frame of the engine's call stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Name of the container the frame's pointer sits in, when the engine
    /// exposes one. May be a synthetic compiler-generated name.
    pub container: Option<String>,
}

/// The three vantage points the engine exposes into its position, captured
/// at a single instant. Any of them may be stale, absent, or refer to
/// synthetic container names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Call stack frames, oldest first; the active frame is last
    pub frames: Vec<FrameSnapshot>,

    /// Container name of the active thread's current pointer
    pub current_container: Option<String>,

    /// Dotted path string (`knot.stitch.index...`) of the current position
    pub path_string: Option<String>,
}

impl EngineSnapshot {
    /// Snapshot with no signal at all
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Handle to a live story-execution engine.
///
/// `snapshot` must not fail: an implementation catches its runtime's
/// introspection errors and maps missing or failing properties to `None`
/// fields, so each detection heuristic sees "no signal" instead of an
/// exception.
pub trait StoryEngine {
    /// Capture the current position signals
    fn snapshot(&self) -> EngineSnapshot;

    /// Whether the story can produce more output without a choice
    fn can_continue(&self) -> bool;

    /// Advance one step, returning the emitted text
    fn continue_story(&mut self) -> Result<String, EngineError>;

    /// Commit the choice at `index`
    fn choose_choice(&mut self, index: usize) -> Result<(), EngineError>;

    /// Serialize full engine state to JSON
    fn export_state(&self) -> Result<String, EngineError>;

    /// Restore engine state from a previous `export_state` result
    fn restore_state(&mut self, json: &str) -> Result<(), EngineError>;

    /// Texts of the currently offered choices
    fn current_choices(&self) -> Vec<String>;
}
