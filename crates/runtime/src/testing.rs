//! Scripted in-memory engine for tests.
//!
//! Embedders and this workspace's own tests need a [`StoryEngine`] that
//! replays a fixed timeline of snapshots without a real scripting runtime.

use crate::engine::{EngineError, EngineSnapshot, StoryEngine};
use serde::{Deserialize, Serialize};

/// A fake engine that walks a pre-scripted timeline of snapshots.
///
/// `export_state` / `restore_state` round-trip the full mutable state, so
/// rollback behavior can be asserted exactly.
pub struct ScriptedEngine {
    steps: Vec<EngineSnapshot>,
    cursor: usize,
    choices: Vec<String>,
    chosen: Vec<usize>,

    /// Make `continue_story` fail
    pub fail_continue: bool,

    /// Make `export_state` fail
    pub fail_export: bool,

    /// Make `choose_choice` fail
    pub fail_choose: bool,
}

#[derive(Serialize, Deserialize)]
struct ScriptedState {
    cursor: usize,
    chosen: Vec<usize>,
}

impl ScriptedEngine {
    pub fn from_snapshots(steps: Vec<EngineSnapshot>) -> Self {
        Self {
            steps,
            cursor: 0,
            choices: Vec::new(),
            chosen: Vec::new(),
            fail_continue: false,
            fail_export: false,
            fail_choose: false,
        }
    }

    /// Timeline where each step reports one container name via the
    /// current pointer.
    pub fn linear(containers: &[&str]) -> Self {
        Self::from_snapshots(
            containers
                .iter()
                .map(|name| EngineSnapshot {
                    current_container: Some((*name).to_string()),
                    ..Default::default()
                })
                .collect(),
        )
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Choice indices committed so far
    pub fn chosen(&self) -> &[usize] {
        &self.chosen
    }
}

impl StoryEngine for ScriptedEngine {
    fn snapshot(&self) -> EngineSnapshot {
        self.steps.get(self.cursor).cloned().unwrap_or_default()
    }

    fn can_continue(&self) -> bool {
        self.cursor + 1 < self.steps.len()
    }

    fn continue_story(&mut self) -> Result<String, EngineError> {
        if self.fail_continue {
            return Err(EngineError::Advance("scripted failure".to_string()));
        }
        if !self.can_continue() {
            return Err(EngineError::Advance("end of script".to_string()));
        }
        self.cursor += 1;
        Ok(String::new())
    }

    fn choose_choice(&mut self, index: usize) -> Result<(), EngineError> {
        if self.fail_choose {
            return Err(EngineError::InvalidChoice(index));
        }
        self.chosen.push(index);
        Ok(())
    }

    fn export_state(&self) -> Result<String, EngineError> {
        if self.fail_export {
            return Err(EngineError::State("scripted failure".to_string()));
        }
        serde_json::to_string(&ScriptedState {
            cursor: self.cursor,
            chosen: self.chosen.clone(),
        })
        .map_err(|e| EngineError::State(e.to_string()))
    }

    fn restore_state(&mut self, json: &str) -> Result<(), EngineError> {
        let state: ScriptedState =
            serde_json::from_str(json).map_err(|e| EngineError::State(e.to_string()))?;
        self.cursor = state.cursor;
        self.chosen = state.chosen;
        Ok(())
    }

    fn current_choices(&self) -> Vec<String> {
        self.choices.clone()
    }
}
