use serde::Serialize;
use story_graph::{DanglingDivert, StoryGraph};

/// Names that mark an intentional story ending rather than an authoring
/// mistake when a knot has no outgoing transitions.
const ENDING_MARKERS: &[&str] = &["end", "finish", "done"];

fn looks_like_ending(name: &str) -> bool {
    let lower = name.to_lowercase();
    ENDING_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Categorized structural diagnostics for a story.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    /// Problems that likely break playback
    pub issues: Vec<String>,

    /// Suspicious structure worth an author's attention
    pub warnings: Vec<String>,

    /// Style-level observations
    pub suggestions: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate story structure. Never fails; a missing structure is itself a
/// reported issue.
pub fn validate_structure(
    structure: Option<&StoryGraph>,
    dangling: &[DanglingDivert],
) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    let Some(graph) = structure else {
        report
            .issues
            .push("no compiled story structure available yet".to_string());
        return report;
    };

    if graph.knot_count() == 0 {
        report
            .issues
            .push("compiled story contains no knots".to_string());
        return report;
    }

    let entry_points = graph.entry_points();
    if entry_points.is_empty() {
        report.warnings.push(
            "no entry points: every knot has an incoming transition (possible cycle)".to_string(),
        );
    }

    let reachable = graph.reachable_set();
    for name in graph.knot_ids() {
        if !reachable.contains(&name) {
            report
                .issues
                .push(format!("knot '{name}' is unreachable from any entry point"));
        }
    }

    for name in graph.knot_ids() {
        if graph.is_dead_end(&name) && !looks_like_ending(&name) {
            report.warnings.push(format!(
                "knot '{name}' has no outgoing transitions and does not look like an ending"
            ));
        }
    }

    for divert in dangling {
        report.warnings.push(format!(
            "divert from '{}' to unresolved target '{}'",
            divert.source, divert.target
        ));
    }

    let branching = graph.average_branching_factor();
    if graph.knot_count() > 1 && branching < 1.05 {
        report.suggestions.push(format!(
            "story flow is almost linear ({branching:.2} transitions per knot); consider adding choices"
        ));
    } else if branching > 3.0 {
        report.suggestions.push(format!(
            "high branching factor ({branching:.2} transitions per knot); consider consolidating paths"
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::GraphBuilder;
    use serde_json::json;

    #[test]
    fn missing_structure_is_an_issue_not_a_failure() {
        let report = validate_structure(None, &[]);
        assert!(!report.is_clean());
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn fully_connected_story_has_no_issues() {
        let doc = json!({"root": [{
            "A": [
                {"*": ".^.c-0", "c-0": ["^on", {"->": "B"}]},
                {"*": ".^.c-1", "c-1": ["^off", {"->": "the_end"}]},
            ],
            "B": [{"->": "the_end"}],
            "the_end": ["^fin"],
        }]});
        let outcome = GraphBuilder::build(&doc);
        let report = validate_structure(Some(&outcome.graph), &outcome.dangling);

        assert!(report.is_clean());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn cycle_only_knots_are_unreachable() {
        let doc = json!({"root": [{
            "A": ["^a"],
            "B": [{"->": "C"}],
            "C": [{"->": "B"}],
        }]});
        let outcome = GraphBuilder::build(&doc);
        let report = validate_structure(Some(&outcome.graph), &outcome.dangling);

        assert_eq!(report.issues.len(), 2);
        assert!(report.issues[0].contains("'B'"));
        assert!(report.issues[1].contains("'C'"));
    }

    #[test]
    fn ending_like_dead_ends_are_not_warned() {
        let doc = json!({"root": [{
            "A": [{"->": "the_end"}],
            "the_end": ["^fin"],
            "stuck": ["^hmm"],
        }]});
        let outcome = GraphBuilder::build(&doc);
        let report = validate_structure(Some(&outcome.graph), &outcome.dangling);

        let dead_end_warnings: Vec<&String> = report
            .warnings
            .iter()
            .filter(|w| w.contains("no outgoing transitions"))
            .collect();
        assert_eq!(dead_end_warnings.len(), 1);
        assert!(dead_end_warnings[0].contains("'stuck'"));
    }

    #[test]
    fn dangling_diverts_surface_as_warnings() {
        let doc = json!({"root": [{"A": [{"->": "missing"}]}]});
        let outcome = GraphBuilder::build(&doc);
        let report = validate_structure(Some(&outcome.graph), &outcome.dangling);

        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("unresolved target 'missing'")));
    }

    #[test]
    fn linear_story_gets_a_suggestion() {
        let doc = json!({"root": [{
            "A": [{"->": "B"}],
            "B": [{"->": "the_end"}],
            "the_end": [],
        }]});
        let outcome = GraphBuilder::build(&doc);
        let report = validate_structure(Some(&outcome.graph), &outcome.dangling);

        assert!(report.suggestions.iter().any(|s| s.contains("linear")));
    }

    #[test]
    fn empty_graph_is_an_issue() {
        let doc = json!({"root": [{"#f": 1}]});
        let outcome = GraphBuilder::build(&doc);
        let report = validate_structure(Some(&outcome.graph), &outcome.dangling);

        assert!(report.issues.iter().any(|i| i.contains("no knots")));
    }
}
