//! Inspection CLI over compiled story bytecode and script sources.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use story_graph::GraphBuilder;
use story_knots::{scan_source, UnifiedKnotManager};

#[derive(Parser)]
#[command(name = "knots", version, about = "Inspect story knot graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the knot graph of a compiled story as JSON
    Graph {
        /// Compiled story (.json)
        story: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Run structural integrity checks on a compiled story
    Validate {
        /// Compiled story (.json)
        story: PathBuf,
    },

    /// Search knot names in a compiled story
    Search {
        /// Compiled story (.json)
        story: PathBuf,

        query: String,
    },

    /// List knot and variable declarations in a script source file
    Scan {
        /// Script source (.ink)
        source: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Graph { story, pretty } => graph(&story, pretty),
        Command::Validate { story } => validate(&story),
        Command::Search { story, query } => search(&story, &query),
        Command::Scan { source } => scan(&source),
    }
}

fn load_story(path: &Path) -> Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn graph(path: &Path, pretty: bool) -> Result<()> {
    let story = load_story(path)?;
    let outcome = GraphBuilder::build(&story);
    let snapshot = outcome.graph.snapshot();

    let rendered = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{rendered}");

    for divert in &outcome.dangling {
        log::warn!("dangling divert: {} -> {}", divert.source, divert.target);
    }
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let story = load_story(path)?;
    let mut manager = UnifiedKnotManager::new();
    let summary = manager.set_compiled_story(&story);
    let report = manager.validate_story_integrity();

    println!(
        "{} knots, {} links, {} dangling diverts",
        summary.knots, summary.links, summary.dangling
    );
    for issue in &report.issues {
        println!("issue: {issue}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for suggestion in &report.suggestions {
        println!("suggestion: {suggestion}");
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
    println!("structure OK");
    Ok(())
}

fn search(path: &Path, query: &str) -> Result<()> {
    let story = load_story(path)?;
    let mut manager = UnifiedKnotManager::new();
    manager.set_compiled_story(&story);

    for name in manager.search_knots(query) {
        println!("{name}");
    }
    Ok(())
}

fn scan(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let scanned = scan_source(&content);

    for knot in &scanned.knots {
        println!("{}:{} knot {}", path.display(), knot.line, knot.name);
    }
    for var in &scanned.variables {
        println!("{}:{} var {}", path.display(), var.line, var.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_story_round_trips_a_compiled_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"root": [{{}}, {{"A": ["^go", {{"->": "B"}}], "B": []}}]}}"#).unwrap();

        let story = load_story(file.path()).unwrap();
        let outcome = GraphBuilder::build(&story);
        assert_eq!(outcome.graph.knot_count(), 2);
        assert_eq!(outcome.graph.link_count(), 1);
    }

    #[test]
    fn load_story_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_story(file.path()).is_err());
    }
}
