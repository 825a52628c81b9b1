//! # Story Runtime
//!
//! Runtime position detection over a live story engine.
//!
//! The engine never reports "the player is in knot X" directly; the current
//! knot is inferred from several partially overlapping signals (execution
//! call stack, current pointer, dotted path string), none of which is
//! authoritative on its own. This crate captures those signals behind the
//! [`StoryEngine`] trait, runs them through an ordered heuristic chain, and
//! falls back through caller hints, per-detector memory, and a fixed
//! sentinel so that detection never fails outright.
//!
//! Choice-target prediction uses a per-knot [`KnotFlowMap`]; an
//! optional speculative verification advances the engine one step under an
//! RAII rollback guard and adopts what it observes when it contradicts the
//! prediction.

mod detector;
mod engine;
mod flow;
mod heuristics;
mod names;
mod rollback;
pub mod testing;

pub use detector::{DetectOptions, PositionDetector, START_KNOT};
pub use engine::{EngineError, EngineSnapshot, FrameSnapshot, StoryEngine};
pub use flow::{KnotFlow, KnotFlowMap};
pub use heuristics::{resolve_position, Heuristic, DETECTION_CHAIN};
pub use names::is_valid_knot_name;
pub use rollback::RollbackGuard;
