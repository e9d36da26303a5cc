//! "Did you mean" suggestions for misspelled keywords and references.

use serde::Deserialize;

/// How a candidate relates to the input. Variants are ordered by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    Distance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub value: String,
    /// Case-insensitive Levenshtein distance to the input.
    pub distance: usize,
    pub kind: MatchKind,
}

/// Limits applied by [`find_closest_matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SuggestOptions {
    pub max_suggestions: usize,
    /// Candidates other than exact matches are dropped beyond this distance.
    pub max_distance: usize,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            max_suggestions: 3,
            max_distance: 3,
        }
    }
}

/// Ranks `candidates` against `input`.
///
/// Matching is case-insensitive. A substring match means the candidate
/// contains the input. Results are ordered exact, then prefix, then
/// substring, then by raw distance; ties keep alphabetical order so output is
/// stable. Only exact matches bypass `max_distance`.
///
/// ```
/// # use cartograph_parser::{find_closest_matches, suggest::SuggestOptions};
/// let shapes = ["rectangle", "circle", "diamond"];
/// let matches = find_closest_matches("rectange", shapes, &SuggestOptions::default());
/// assert_eq!(matches[0].value, "rectangle");
/// ```
pub fn find_closest_matches<I, S>(
    input: &str,
    candidates: I,
    options: &SuggestOptions,
) -> Vec<Suggestion>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = input.to_lowercase();
    if needle.is_empty() || options.max_suggestions == 0 {
        return Vec::new();
    }

    let mut matches: Vec<Suggestion> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let lowered = candidate.to_lowercase();
            let distance = strsim::levenshtein(&needle, &lowered);

            if lowered == needle {
                return Some(Suggestion {
                    value: candidate.to_string(),
                    distance,
                    kind: MatchKind::Exact,
                });
            }
            if distance > options.max_distance {
                return None;
            }

            let kind = if lowered.starts_with(&needle) {
                MatchKind::Prefix
            } else if lowered.contains(&needle) {
                MatchKind::Substring
            } else {
                MatchKind::Distance
            };

            Some(Suggestion {
                value: candidate.to_string(),
                distance,
                kind,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.distance.cmp(&b.distance))
            .then_with(|| a.value.cmp(&b.value))
    });
    matches.dedup_by(|a, b| a.value == b.value);
    matches.truncate(options.max_suggestions);
    matches
}

/// Formats the best matches as help text, or `None` when nothing is close.
pub fn did_you_mean<I, S>(input: &str, candidates: I, options: &SuggestOptions) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let matches = find_closest_matches(input, candidates, options);
    match matches.as_slice() {
        [] => None,
        [only] => Some(format!("did you mean `{}`?", only.value)),
        many => {
            let names: Vec<String> = many.iter().map(|s| format!("`{}`", s.value)).collect();
            Some(format!("did you mean one of {}?", names.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPES: &[&str] = &[
        "rectangle",
        "rounded",
        "circle",
        "ellipse",
        "diamond",
        "cylinder",
        "triangle",
    ];

    fn values(matches: &[Suggestion]) -> Vec<&str> {
        matches.iter().map(|s| s.value.as_str()).collect()
    }

    #[test]
    fn test_typo_ranks_closest_first() {
        let matches = find_closest_matches("rectange", SHAPES, &SuggestOptions::default());
        assert_eq!(matches[0].value, "rectangle");
        assert_eq!(matches[0].kind, MatchKind::Distance);
        assert_eq!(matches[0].distance, 1);
    }

    #[test]
    fn test_exact_match_comes_first() {
        let matches = find_closest_matches("rectangle", SHAPES, &SuggestOptions::default());
        assert_eq!(matches[0].value, "rectangle");
        assert_eq!(matches[0].kind, MatchKind::Exact);
        assert_eq!(matches[0].distance, 0);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let matches = find_closest_matches("Circle", SHAPES, &SuggestOptions::default());
        assert_eq!(matches[0].value, "circle");
        assert_eq!(matches[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_prefix_beats_smaller_distance() {
        let candidates = ["cylin", "cyl", "cy"];
        let matches = find_closest_matches("cyl", candidates, &SuggestOptions::default());
        assert_eq!(values(&matches), vec!["cyl", "cylin", "cy"]);
        assert_eq!(matches[1].kind, MatchKind::Prefix);
        assert_eq!(matches[2].kind, MatchKind::Distance);
    }

    #[test]
    fn test_substring_beats_distance() {
        let candidates = ["rebased", "base", "bass"];
        let matches = find_closest_matches("base", candidates, &SuggestOptions::default());
        assert_eq!(values(&matches), vec!["base", "rebased", "bass"]);
        assert_eq!(matches[1].kind, MatchKind::Substring);
    }

    #[test]
    fn test_shorter_candidate_inside_input_is_not_a_substring_match() {
        let matches = find_closest_matches("rectange", ["rect"], &SuggestOptions::default());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_prefix_and_substring_respect_distance_limit() {
        let matches = find_closest_matches("db", ["database", "mydb"], &SuggestOptions::default());
        assert_eq!(values(&matches), vec!["mydb"]);
    }

    #[test]
    fn test_typo_ranks_closest_against_builtin_catalog() {
        let registry = cartograph_core::shape::ShapeRegistry::with_builtins();
        let matches = find_closest_matches("rectange", registry.names(), &SuggestOptions::default());
        assert_eq!(matches[0].value, "rectangle");
        assert!(!values(&matches).contains(&"rect"));
        assert_eq!(
            did_you_mean("rectange", registry.names(), &SuggestOptions::default()).as_deref(),
            Some("did you mean `rectangle`?")
        );
    }

    #[test]
    fn test_distance_threshold_drops_far_candidates() {
        let matches = find_closest_matches("zzzz", SHAPES, &SuggestOptions::default());
        assert!(matches.is_empty());

        let strict = SuggestOptions {
            max_suggestions: 3,
            max_distance: 0,
        };
        assert!(find_closest_matches("rectange", SHAPES, &strict).is_empty());
    }

    #[test]
    fn test_max_suggestions_caps_output() {
        let options = SuggestOptions {
            max_suggestions: 2,
            max_distance: 10,
        };
        let matches = find_closest_matches("e", SHAPES, &options);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_suggestions() {
        assert!(find_closest_matches("", SHAPES, &SuggestOptions::default()).is_empty());
    }

    #[test]
    fn test_did_you_mean_formatting() {
        let options = SuggestOptions::default();
        assert_eq!(
            did_you_mean("circel", SHAPES, &options).as_deref(),
            Some("did you mean `circle`?")
        );
        assert_eq!(did_you_mean("qqqqqq", SHAPES, &options), None);
    }
}
