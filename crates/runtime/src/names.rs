use once_cell::sync::Lazy;
use regex::Regex;

/// Compiler-generated container names: choice branches (`c-<n>`), logic
/// blocks (`b`), gather points (`g-<n>`), and bare element indices.
static SYNTHETIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:c-\d+|b|g-\d+|\d+)$").expect("valid synthetic-name pattern"));

/// Internal flow identifier the engine reports when no named flow is active
const DEFAULT_FLOW: &str = "DEFAULT_FLOW";

/// Whether `name` can denote an author-named knot.
///
/// Synthetic container names come out of the same engine properties as real
/// knot names and must never be mistaken for a position.
pub fn is_valid_knot_name(name: &str) -> bool {
    !name.is_empty() && name != DEFAULT_FLOW && !SYNTHETIC_NAME.is_match(name)
}
