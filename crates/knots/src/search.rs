use std::collections::HashSet;

/// Rank knot names against a query: exact match first, then prefix
/// matches, then other substring matches, lexicographic within each tier.
/// Matching is case-insensitive; non-matching names are dropped.
pub fn search_knot_names<'a, I>(names: I, query: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = query.to_lowercase();
    let mut seen = HashSet::new();

    let mut ranked: Vec<(u8, String)> = names
        .into_iter()
        .filter(|name| seen.insert(name.to_string()))
        .filter_map(|name| {
            let haystack = name.to_lowercase();
            let tier = if haystack == needle {
                0
            } else if haystack.starts_with(&needle) {
                1
            } else if haystack.contains(&needle) {
                2
            } else {
                return None;
            };
            Some((tier, name.to_string()))
        })
        .collect();

    ranked.sort();
    ranked.into_iter().map(|(_, name)| name).collect()
}
