//! End-to-end: compiled bytecode -> static graph -> validated runtime
//! position detection, exercising the full reconciliation path the editor
//! drives on every playback step.

use pretty_assertions::assert_eq;
use serde_json::json;
use story_knots::UnifiedKnotManager;
use story_runtime::testing::ScriptedEngine;
use story_runtime::{EngineSnapshot, FrameSnapshot, StoryEngine};

fn minimal_story() -> serde_json::Value {
    json!({"root": [{}, {"A": ["^go", {"->": "B"}], "B": ["^end"]}]})
}

#[test]
fn bytecode_to_graph_to_validated_position() {
    let mut manager = UnifiedKnotManager::new();
    let summary = manager.set_compiled_story(&minimal_story());

    assert_eq!(summary.knots, 2);
    assert_eq!(summary.links, 1);

    let snapshot = manager.story_structure();
    let ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(snapshot.links[0].source, "A");
    assert_eq!(snapshot.links[0].target, "B");
    assert_eq!(snapshot.links[0].label, "go");

    // A runtime signal naming a real knot is accepted as-is.
    let engine = ScriptedEngine::linear(&["A"]);
    assert_eq!(manager.current_knot(&engine), "A");

    // A signal naming only a synthetic container falls back to the first
    // static knot.
    let mut synthetic_only = UnifiedKnotManager::new();
    synthetic_only.set_compiled_story(&minimal_story());
    let engine = ScriptedEngine::linear(&["c-0"]);
    assert_eq!(synthetic_only.current_knot(&engine), "A");
}

#[test]
fn call_stack_beats_path_string_through_the_full_stack() {
    let mut manager = UnifiedKnotManager::new();
    manager.set_compiled_story(&json!({"root": [{}, {
        "harbor": [{"->": "market"}],
        "market": ["^stalls"],
    }]}));

    let engine = ScriptedEngine::from_snapshots(vec![EngineSnapshot {
        frames: vec![FrameSnapshot {
            container: Some("market".to_string()),
        }],
        current_container: Some("g-2".to_string()),
        path_string: Some("harbor.0".to_string()),
    }]);

    assert_eq!(manager.current_knot(&engine), "market");
}

#[test]
fn playback_session_tracks_position_across_steps() {
    let story = json!({"root": [{}, {
        "crossroads": [
            {"*": ".^.c-0", "c-0": ["^east", {"->": "east_gate"}]},
            {"*": ".^.c-1", "c-1": ["^west", {"->": "west_gate"}]},
        ],
        "east_gate": [{"->": "camp_end"}],
        "west_gate": [{"->": "camp_end"}],
        "camp_end": ["^done"],
    }]});

    let mut manager = UnifiedKnotManager::new();
    manager.set_compiled_story(&story);

    // Step 1: engine sits in the crossroads.
    let mut engine = ScriptedEngine::linear(&["crossroads", "east_gate", "camp_end"]);
    assert_eq!(manager.current_knot(&engine), "crossroads");

    // Step 2: predict where choice 0 leads before committing it.
    let predicted = manager.predict_knot_after_choice(&mut engine, "crossroads", 0);
    assert_eq!(predicted, "east_gate");

    // Step 3: the engine advances; detection follows.
    engine.continue_story().unwrap();
    assert_eq!(manager.current_knot(&engine), "east_gate");

    let info = manager.knot_info("east_gate").unwrap();
    assert_eq!(info.is_current, Some(true));
    assert_eq!(info.targets, vec!["camp_end"]);
}

#[test]
fn source_only_knots_are_searchable_before_compilation() {
    let mut manager = UnifiedKnotManager::new();
    manager.add_source_file(
        "day1.ink",
        "VAR mood = 0\n=== day1_start ===\nMorning.\n=== day1_market ===\nNoon.\n",
    );

    assert_eq!(
        manager.search_knots("day1"),
        vec!["day1_market", "day1_start"]
    );
    assert_eq!(manager.knots_in_file("day1.ink").len(), 2);

    let info = manager.knot_info("day1_start").unwrap();
    assert_eq!(info.file_path.as_deref(), Some("day1.ink"));
    assert_eq!(info.line_number, Some(2));
    assert_eq!(info.is_reachable, None);
}

#[test]
fn integrity_report_covers_dangling_and_unreachable() {
    let mut manager = UnifiedKnotManager::new();
    manager.set_compiled_story(&json!({"root": [{}, {
        "A": [{"->": "ghost_town"}],
        "loop_a": [{"->": "loop_b"}],
        "loop_b": [{"->": "loop_a"}],
    }]}));

    let report = manager.validate_story_integrity();
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("'ghost_town'")));
    assert!(report.issues.iter().any(|i| i.contains("'loop_a'")));
    assert!(report.issues.iter().any(|i| i.contains("'loop_b'")));
}
