//! Candidate scoring for free-text provider search.
//!
//! Only the ordering matters: exact slug > slug prefix > slug substring >
//! link-text match > surrounding-context match.

const EXACT: u32 = 100;
const PREFIX: u32 = 50;
const SUBSTRING: u32 = 25;
const TEXT: u32 = 10;
const CONTEXT: u32 = 5;

/// A provider listed on the search surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub slug: String,
    /// Visible link text.
    pub name: String,
    /// Text of the enclosing result block.
    pub context: String,
}

/// Lower-case, ASCII-alphanumeric runs joined by `-`.
pub fn slugify(input: &str) -> String {
    input
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Score a candidate against a query; 0 means no match at all.
pub fn score(query: &str, candidate: &Candidate) -> u32 {
    let query_slug = slugify(query);
    if query_slug.is_empty() {
        return 0;
    }
    let slug = candidate.slug.to_lowercase();
    let needle = query.trim().to_lowercase();

    if slug == query_slug {
        EXACT
    } else if slug.starts_with(&query_slug) {
        PREFIX
    } else if slug.contains(&query_slug) {
        SUBSTRING
    } else if candidate.name.to_lowercase().contains(&needle) {
        TEXT
    } else if candidate.context.to_lowercase().contains(&needle) {
        CONTEXT
    } else {
        0
    }
}

/// Highest-scoring candidate strictly above zero; ties keep page order.
pub fn best_candidate<'a>(query: &str, candidates: &'a [Candidate]) -> Option<(&'a Candidate, u32)> {
    let mut best: Option<(&Candidate, u32)> = None;
    for candidate in candidates {
        let s = score(query, candidate);
        if s > 0 && best.is_none_or(|(_, b)| s > b) {
            best = Some((candidate, s));
        }
    }
    best
}
