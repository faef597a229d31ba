#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Temporal-Violation-of-Context detection: a purely functional scan of
//! output text for year references beyond the declared boundary.

use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

/// The detector's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one extracted year exceeds `t_target` and the context had
    /// no corroborating post-boundary item.
    Strong,
    /// No violation was found.
    None,
}

/// Result of running the detector over one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvocResult {
    /// The detector's verdict.
    pub verdict: Verdict,
    /// Years found in the output that exceed `t_target`, ascending, deduped.
    pub violating_years: Vec<i64>,
    /// The boundary the output was checked against.
    pub t_target: i64,
}

/// Extracts all 1900-2099 year references from `text`, in order of first
/// appearance with duplicates removed, via `\b(19|20)\d{2}\b`.
#[must_use]
pub fn extract_years(text: &str) -> Vec<i64> {
    let mut seen = Vec::new();
    for m in YEAR_RE.find_iter(text) {
        if let Ok(year) = m.as_str().parse::<i64>() {
            if !seen.contains(&year) {
                seen.push(year);
            }
        }
    }
    seen
}

/// Runs the detector: `STRONG` iff some extracted year exceeds `t_target`
/// and `context_has_post_target` is false; `NONE` otherwise.
///
/// Purely functional: consults neither the ledger nor any other state.
#[must_use]
pub fn detect(text: &str, t_target: i64, context_has_post_target: bool) -> TvocResult {
    let mut violating: Vec<i64> = extract_years(text).into_iter().filter(|y| *y > t_target).collect();
    violating.sort_unstable();
    let verdict = if !violating.is_empty() && !context_has_post_target {
        Verdict::Strong
    } else {
        Verdict::None
    };
    TvocResult {
        verdict,
        violating_years: violating,
        t_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_years_in_1900_to_2099_range_only() {
        let years = extract_years("in 1999 and 2026 but not 1899 or 2100 or 18000");
        assert_eq!(years, vec![1999, 2026]);
    }

    #[test]
    fn strong_verdict_when_a_future_year_appears_without_post_target_context() {
        let result = detect("the forecast for 2030 looks promising", 2025, false);
        assert_eq!(result.verdict, Verdict::Strong);
        assert_eq!(result.violating_years, vec![2030]);
    }

    #[test]
    fn none_verdict_when_context_corroborates_the_post_target_reference() {
        let result = detect("the forecast for 2030 looks promising", 2025, true);
        assert_eq!(result.verdict, Verdict::None);
    }

    #[test]
    fn none_verdict_when_no_year_exceeds_the_boundary() {
        let result = detect("back in 2020 this happened", 2025, false);
        assert_eq!(result.verdict, Verdict::None);
        assert!(result.violating_years.is_empty());
    }

    #[test]
    fn duplicate_years_are_deduped_and_sorted() {
        let result = detect("2099 2030 2030 2099", 2025, false);
        assert_eq!(result.violating_years, vec![2030, 2099]);
    }
}
