//! Candidate bracketing filters.
//!
//! A table with many ambiguous bracketings produces a combinatorial cross
//! product of candidate combinations. The filters below prune each word's
//! candidate list with cheap heuristics until the product fits under the
//! table cap.

use crate::bracket::Bracketing;

/// Candidate bracketings per word of a table.
pub type FactorList = Vec<Vec<Bracketing>>;

/// A heuristic that narrows every word's candidate list.
pub type BracketingFilter = fn(&[Vec<Bracketing>]) -> FactorList;

/// Filters in the order they are applied.
pub const DEFAULT_FILTERS: [BracketingFilter; 5] = [
    filter_common_prefix,
    filter_shortest,
    filter_shortest_infix,
    filter_longest_variable,
    filter_leftmost_variables,
];

/// Number of combinations in the cross product of the candidate lists.
pub fn count_combinations(factors: &[Vec<Bracketing>]) -> usize {
    factors
        .iter()
        .fold(1usize, |acc, f| acc.saturating_mul(f.len()))
}

/// Apply `filters` in order while the cross product exceeds `cap`.
///
/// A filter that would leave some word without candidates is skipped.
pub fn filter_bracketings(
    factors: FactorList,
    filters: &[BracketingFilter],
    cap: usize,
) -> FactorList {
    let mut factors = factors;
    for filter in filters {
        if count_combinations(&factors) <= cap {
            break;
        }
        let filtered = filter(&factors);
        if filtered.iter().any(Vec::is_empty) {
            continue;
        }
        factors = filtered;
    }
    factors
}

/// Keep bracketings whose display form continues, after its first
/// character, with the prefix common to every word of the table.
pub fn filter_common_prefix(factors: &[Vec<Bracketing>]) -> FactorList {
    let words: Vec<String> = factors
        .iter()
        .filter_map(|f| f.first())
        .map(Bracketing::text)
        .collect();
    let prefix = common_prefix(&words);

    factors
        .iter()
        .map(|candidates| {
            candidates
                .iter()
                .filter(|b| b.shifted_starts_with(&prefix))
                .cloned()
                .collect()
        })
        .collect()
}

/// Keep the candidates with the shortest bracketed display form.
pub fn filter_shortest(factors: &[Vec<Bracketing>]) -> FactorList {
    factors
        .iter()
        .map(|c| keep_minimal(c, Bracketing::bracketed_len))
        .collect()
}

/// Keep the candidates with the fewest fixed characters between variables.
pub fn filter_shortest_infix(factors: &[Vec<Bracketing>]) -> FactorList {
    factors
        .iter()
        .map(|c| keep_minimal(c, Bracketing::infix_count))
        .collect()
}

/// Keep the candidates whose longest variable is longest.
pub fn filter_longest_variable(factors: &[Vec<Bracketing>]) -> FactorList {
    factors
        .iter()
        .map(|c| keep_minimal(c, |b| std::cmp::Reverse(b.longest_variable())))
        .collect()
}

/// Keep the candidates whose variables open furthest to the left.
pub fn filter_leftmost_variables(factors: &[Vec<Bracketing>]) -> FactorList {
    factors
        .iter()
        .map(|c| keep_minimal(c, Bracketing::bracket_position_sum))
        .collect()
}

fn keep_minimal<K: Ord>(candidates: &[Bracketing], key: impl Fn(&Bracketing) -> K) -> Vec<Bracketing> {
    let Some(best) = candidates.iter().map(&key).min() else {
        return Vec::new();
    };
    candidates
        .iter()
        .filter(|b| key(b) == best)
        .cloned()
        .collect()
}

fn common_prefix(words: &[String]) -> String {
    let Some(first) = words.first() else {
        return String::new();
    };
    let mut len = first.chars().count();
    for word in &words[1..] {
        len = first
            .chars()
            .zip(word.chars())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }
    first.chars().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{find_factors, parse_bracketing};

    fn list(items: &[&[&str]]) -> FactorList {
        items
            .iter()
            .map(|word| word.iter().map(|b| parse_bracketing(b)).collect())
            .collect()
    }

    fn shown(factors: &FactorList) -> Vec<Vec<String>> {
        factors
            .iter()
            .map(|c| c.iter().map(|b| b.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_count_combinations() {
        let factors = list(&[&["[a]b", "a[b]"], &["[a]", "x[a]", "[a]y"]]);
        assert_eq!(count_combinations(&factors), 6);
        assert_eq!(count_combinations(&[]), 1);
    }

    #[test]
    fn test_common_prefix() {
        let words = vec!["stad".to_string(), "städer".to_string(), "stads".to_string()];
        assert_eq!(common_prefix(&words), "st");
        assert_eq!(common_prefix(&[]), "");
    }

    #[test]
    fn test_filter_common_prefix() {
        let factors = list(&[&["[ab]ab", "[a]ba[b]", "ab[ab]"], &["[ab]"]]);
        let filtered = filter_common_prefix(&factors);
        assert_eq!(shown(&filtered), vec![vec!["[ab]ab"], vec!["[ab]"]]);
    }

    #[test]
    fn test_filter_common_prefix_on_literal_initial_words() {
        // Common prefix "a"; the comparison starts at the second character
        let factors = list(&[&["a[ab]", "[a]a[b]", "aa[b]"], &["[ab]"]]);
        let filtered = filter_common_prefix(&factors);
        assert_eq!(shown(&filtered), vec![vec!["[a]a[b]", "aa[b]"], vec!["[ab]"]]);
    }

    #[test]
    fn test_filter_shortest_and_leftmost() {
        let factors = list(&[&["[ab]ab", "[a]ba[b]", "ab[ab]"]]);
        let shortest = filter_shortest(&factors);
        assert_eq!(shown(&shortest), vec![vec!["[ab]ab", "ab[ab]"]]);
        let leftmost = filter_leftmost_variables(&shortest);
        assert_eq!(shown(&leftmost), vec![vec!["[ab]ab"]]);
    }

    #[test]
    fn test_filter_infix_and_longest() {
        let factors = list(&[&["[a]x[b]", "[ab]x", "[a]xy[b]"]]);
        assert_eq!(
            shown(&filter_shortest_infix(&factors)),
            vec![vec!["[ab]x"]]
        );
        assert_eq!(
            shown(&filter_longest_variable(&factors)),
            vec![vec!["[ab]x"]]
        );
    }

    #[test]
    fn test_filter_bracketings_stops_under_cap() {
        let factors: FactorList = ["abab", "abab"]
            .iter()
            .map(|w| find_factors(w, "ab"))
            .collect();
        assert_eq!(count_combinations(&factors), 9);

        // Under the cap: untouched
        let kept = filter_bracketings(factors.clone(), &DEFAULT_FILTERS, 16);
        assert_eq!(count_combinations(&kept), 9);

        let pruned = filter_bracketings(factors, &DEFAULT_FILTERS, 1);
        assert_eq!(shown(&pruned), vec![vec!["[ab]ab"], vec!["[ab]ab"]]);
    }

    #[test]
    fn test_filter_never_empties_a_word() {
        // No candidate of the second word starts with the common prefix "x"
        let factors = list(&[&["[x]a", "x[a]"], &["x[y]"]]);
        let filtered = filter_bracketings(factors, &[filter_common_prefix], 1);
        assert_eq!(count_combinations(&filtered), 2);
    }
}
