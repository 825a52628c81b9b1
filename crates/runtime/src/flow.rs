use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Known transitions out of one knot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnotFlow {
    /// Target knot per choice index
    pub choices: Vec<String>,

    /// Target when the index is out of range (the knot's main-line divert)
    pub default_target: Option<String>,
}

/// Per-knot transition table used for choice-target prediction.
///
/// The table starts empty; it is story-supplied configuration, normally
/// regenerated from the compiled graph's real edges after each compile.
/// A knot without an entry predicts no transition.
pub type KnotFlowMap = HashMap<String, KnotFlow>;
