//! Ordered chain of position heuristics.
//!
//! Each heuristic is a pure function over an [`EngineSnapshot`]; the
//! resolver walks the chain and stops at the first hit. Keeping the
//! heuristics free of engine access means each one is unit-testable
//! against a constructed snapshot.

use crate::engine::EngineSnapshot;
use crate::names::is_valid_knot_name;

pub type Heuristic = fn(&EngineSnapshot) -> Option<String>;

/// Most recent call-stack frame whose container name is a real knot.
///
/// The stack is scanned newest-first: an active tunnel or function frame
/// is a better position signal than the frame that invoked it.
fn newest_stack_container(snapshot: &EngineSnapshot) -> Option<String> {
    snapshot
        .frames
        .iter()
        .rev()
        .filter_map(|frame| frame.container.as_deref())
        .find(|name| is_valid_knot_name(name))
        .map(str::to_string)
}

/// The active thread's current-pointer container, if validly named.
fn current_pointer_container(snapshot: &EngineSnapshot) -> Option<String> {
    snapshot
        .current_container
        .as_deref()
        .filter(|name| is_valid_knot_name(name))
        .map(str::to_string)
}

/// First validly named segment of the dotted path string.
fn path_string_segment(snapshot: &EngineSnapshot) -> Option<String> {
    snapshot
        .path_string
        .as_deref()?
        .split('.')
        .find(|segment| is_valid_knot_name(segment))
        .map(str::to_string)
}

/// Detection chain in priority order; first hit wins.
pub const DETECTION_CHAIN: &[(&str, Heuristic)] = &[
    ("call-stack", newest_stack_container),
    ("current-pointer", current_pointer_container),
    ("path-string", path_string_segment),
];

/// Run the chain against a snapshot.
pub fn resolve_position(snapshot: &EngineSnapshot) -> Option<String> {
    for (source, heuristic) in DETECTION_CHAIN {
        if let Some(knot) = heuristic(snapshot) {
            log::debug!("position resolved via {source}: {knot}");
            return Some(knot);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FrameSnapshot;

    fn frames(names: &[Option<&str>]) -> Vec<FrameSnapshot> {
        names
            .iter()
            .map(|n| FrameSnapshot {
                container: n.map(str::to_string),
            })
            .collect()
    }

    #[test]
    fn stack_is_scanned_newest_first() {
        let snapshot = EngineSnapshot {
            frames: frames(&[Some("outer_knot"), Some("inner_knot")]),
            ..Default::default()
        };
        assert_eq!(resolve_position(&snapshot).as_deref(), Some("inner_knot"));
    }

    #[test]
    fn synthetic_frames_are_skipped() {
        let snapshot = EngineSnapshot {
            frames: frames(&[Some("cave"), Some("c-0"), Some("b")]),
            ..Default::default()
        };
        assert_eq!(resolve_position(&snapshot).as_deref(), Some("cave"));
    }

    #[test]
    fn pointer_beats_path_string() {
        let snapshot = EngineSnapshot {
            frames: frames(&[Some("g-1")]),
            current_container: Some("market".to_string()),
            path_string: Some("harbor.dock.2".to_string()),
        };
        assert_eq!(resolve_position(&snapshot).as_deref(), Some("market"));
    }

    #[test]
    fn path_string_is_last_signal() {
        let snapshot = EngineSnapshot {
            frames: frames(&[Some("c-3"), None]),
            current_container: Some("DEFAULT_FLOW".to_string()),
            path_string: Some("0.g-0.harbor.2".to_string()),
        };
        assert_eq!(resolve_position(&snapshot).as_deref(), Some("harbor"));
    }

    #[test]
    fn no_signal_resolves_to_none() {
        assert_eq!(resolve_position(&EngineSnapshot::empty()), None);
        let all_synthetic = EngineSnapshot {
            frames: frames(&[Some("c-1")]),
            current_container: Some("42".to_string()),
            path_string: Some("g-2.c-0.7".to_string()),
        };
        assert_eq!(resolve_position(&all_synthetic), None);
    }
}
