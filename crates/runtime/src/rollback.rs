use crate::engine::{EngineError, StoryEngine};

/// Scoped snapshot of engine state, restored on drop.
///
/// Speculative verification advances the shared live engine; whatever
/// happens inside the scope (mismatch, error, early return), the engine
/// must come back exactly as it was. Acquiring the guard captures the
/// state JSON; `Drop` restores it unconditionally.
pub struct RollbackGuard<'a, E: StoryEngine> {
    engine: &'a mut E,
    saved: String,
}

impl<'a, E: StoryEngine> RollbackGuard<'a, E> {
    pub fn acquire(engine: &'a mut E) -> Result<Self, EngineError> {
        let saved = engine.export_state()?;
        Ok(Self { engine, saved })
    }

    pub fn engine(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: StoryEngine> Drop for RollbackGuard<'_, E> {
    fn drop(&mut self) {
        if let Err(err) = self.engine.restore_state(&self.saved) {
            log::error!("failed to roll back speculative engine step: {err}");
        }
    }
}
