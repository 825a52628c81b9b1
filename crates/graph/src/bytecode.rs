//! Accessors over the compiled-story JSON document.
//!
//! The bytecode has no schema; the shape relied on here is: a top-level
//! object with a `root` array whose last element maps knot names to body
//! arrays. Everything else is treated as opaque.

use serde_json::{Map, Value};

/// Prefix marking an inline text fragment
pub(crate) const TEXT_PREFIX: char = '^';

/// Key carrying a divert target
pub(crate) const DIVERT_KEY: &str = "->";

/// Key referencing a choice branch by dotted path
pub(crate) const CHOICE_REF_KEY: &str = "*";

/// Locate the named-content map: the last element of the `root` array.
///
/// Returns `None` when the document does not have the expected shape.
pub fn named_content(bytecode: &Value) -> Option<&Map<String, Value>> {
    bytecode.get("root")?.as_array()?.last()?.as_object()
}

/// Keys of the named-content map that do not denote author-named knots:
/// compiler metadata (`#...`) and the reserved `global decl` pseudo-knot.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('#') || key == "global decl"
}

/// Extract the branch key (`c-<n>`) from a dotted choice-reference path.
pub(crate) fn choice_branch_key(path: &str) -> Option<&str> {
    let segment = path.rsplit('.').next()?;
    let digits = segment.strip_prefix("c-")?;
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(segment)
    } else {
        None
    }
}
