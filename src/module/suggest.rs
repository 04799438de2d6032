//! Similarity suggestions for error messages
//!
//! Computes "did you mean" candidates by Levenshtein distance. Suggestions only
//! ever decorate an error; they never change what gets resolved.

use std::fmt;

/// Default edit-distance threshold (candidates must be strictly closer than this)
pub const DEFAULT_SUGGESTION_THRESHOLD: usize = 4;

/// Return the candidates whose edit distance to `target` is below `threshold`
///
/// Comparison is case-insensitive; candidates are returned as given, in their
/// original order. A candidate that shares no aligned character with the target
/// (distance equal to the longer of the two lengths) is never suggested, so a
/// short id is not "similar" to every other short id.
pub fn suggest<I, S>(target: &str, candidates: I, threshold: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let target_lower = target.to_lowercase();
    let target_len = target_lower.chars().count();

    let mut similar = Vec::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let candidate_lower = candidate.to_lowercase();
        let longest = target_len.max(candidate_lower.chars().count());
        let distance = strsim::levenshtein(&target_lower, &candidate_lower);

        if distance < threshold && distance < longest && !similar.iter().any(|s| s == candidate) {
            similar.push(candidate.to_string());
        }
    }
    similar
}

/// Suggestions attached to a lookup failure
///
/// Renders as `; maybe you meant: [a, b]?`, or as nothing when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions(Vec<String>);

impl Suggestions {
    /// No suggestions
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Compute suggestions for `target` from `candidates`
    pub fn find<I, S>(target: &str, candidates: I, threshold: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(suggest(target, candidates, threshold))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.0.iter().any(|s| s == candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<String>> for Suggestions {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

impl fmt::Display for Suggestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "; maybe you meant: [{}]?", self.0.join(", "))
    }
}
