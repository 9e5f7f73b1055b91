//! Generalization of observed variable values into constraints.
//!
//! A constraint is chosen by a simple significance test: a set of `uniq`
//! distinct observations seen across `num` draws is considered the whole
//! population when `(1 - 1/(uniq+1))^num <= pvalue`.

use std::collections::BTreeSet;
use std::fmt;

/// Significance level used when compiling paradigm constraints.
pub const DEFAULT_PVALUE: f64 = 0.05;

/// A learned constraint on the strings a variable may capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generalizer {
    /// Only these strings were ever seen, often enough to trust the set.
    Exact(BTreeSet<String>),
    /// Any combination of the listed prefix, suffix and length bounds.
    /// Empty sets and `None` do not constrain.
    Constrained {
        suffixes: BTreeSet<String>,
        prefixes: BTreeSet<String>,
        lengths: Option<(usize, usize)>,
    },
    /// Any non-empty string.
    Any,
}

impl Generalizer {
    /// Fit a constraint to a pool of observed strings (with repetitions).
    pub fn fit<S: AsRef<str>>(strings: &[S], pvalue: f64) -> Self {
        if strings.is_empty() {
            return Generalizer::Any;
        }

        let words: Vec<Vec<char>> = strings.iter().map(|s| s.as_ref().chars().collect()).collect();
        let num = words.len();

        let distinct: BTreeSet<String> = strings.iter().map(|s| s.as_ref().to_string()).collect();
        if significant(num, distinct.len(), pvalue) {
            return Generalizer::Exact(distinct);
        }

        let min_len = words.iter().map(Vec::len).min().unwrap_or(0);
        let max_len = words.iter().map(Vec::len).max().unwrap_or(0);

        let suffixes = longest_significant(min_len, num, pvalue, |n| {
            words.iter().map(|w| w[w.len() - n..].iter().collect()).collect()
        });
        let prefixes = longest_significant(min_len, num, pvalue, |n| {
            words.iter().map(|w| w[..n].iter().collect()).collect()
        });

        let distinct_lengths: BTreeSet<usize> = words.iter().map(Vec::len).collect();
        let lengths = significant(num, distinct_lengths.len(), pvalue).then_some((min_len, max_len));

        if suffixes.is_empty() && prefixes.is_empty() && lengths.is_none() {
            Generalizer::Any
        } else {
            Generalizer::Constrained {
                suffixes,
                prefixes,
                lengths,
            }
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        self.specificity(s).is_some()
    }

    /// Number of characters of `s` pinned down by the constraint, or
    /// `None` when `s` is rejected.
    pub fn specificity(&self, s: &str) -> Option<usize> {
        let len = s.chars().count();
        if len == 0 {
            return None;
        }
        match self {
            Generalizer::Exact(set) => set.contains(s).then_some(len),
            Generalizer::Any => Some(0),
            Generalizer::Constrained {
                suffixes,
                prefixes,
                lengths,
            } => {
                if let Some((lo, hi)) = lengths {
                    if len < *lo || len > *hi {
                        return None;
                    }
                }
                let suffix_len = affix_len(suffixes, |a| s.ends_with(a))?;
                let prefix_len = affix_len(prefixes, |a| s.starts_with(a))?;
                Some(prefix_len + suffix_len)
            }
        }
    }
}

impl fmt::Display for Generalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn alternatives(set: &BTreeSet<String>) -> String {
            set.iter().cloned().collect::<Vec<_>>().join("|")
        }
        match self {
            Generalizer::Exact(set) => write!(f, "^({})$", alternatives(set)),
            Generalizer::Any => write!(f, ".+"),
            Generalizer::Constrained {
                suffixes,
                prefixes,
                lengths,
            } => {
                if !prefixes.is_empty() {
                    write!(f, "^({})", alternatives(prefixes))?;
                }
                write!(f, ".*")?;
                if !suffixes.is_empty() {
                    write!(f, "({})$", alternatives(suffixes))?;
                }
                if let Some((lo, hi)) = lengths {
                    write!(f, " {{{},{}}}", lo, hi)?;
                }
                Ok(())
            }
        }
    }
}

fn significant(num: usize, uniq: usize, pvalue: f64) -> bool {
    (1.0 - 1.0 / (uniq as f64 + 1.0)).powf(num as f64) <= pvalue
}

/// The affix set of the largest length `n <= max_len` that passes the
/// test, or an empty set.
fn longest_significant(
    max_len: usize,
    num: usize,
    pvalue: f64,
    affixes: impl Fn(usize) -> BTreeSet<String>,
) -> BTreeSet<String> {
    (1..=max_len)
        .rev()
        .map(&affixes)
        .find(|set| significant(num, set.len(), pvalue))
        .unwrap_or_default()
}

/// Length of the matching affix, 0 when unconstrained, `None` on mismatch.
fn affix_len(set: &BTreeSet<String>, test: impl Fn(&str) -> bool) -> Option<usize> {
    if set.is_empty() {
        return Some(0);
    }
    set.iter()
        .find(|a| test(a.as_str()))
        .map(|a| a.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_set() {
        let g = Generalizer::fit(&["d", "d", "d", "d", "d"], DEFAULT_PVALUE);
        assert_eq!(g, Generalizer::Exact(set(&["d"])));
        assert_eq!(g.specificity("d"), Some(1));
        assert_eq!(g.specificity("t"), None);
    }

    #[test]
    fn test_too_few_observations() {
        // (1/2)^4 > 0.05
        let g = Generalizer::fit(&["d", "d", "d", "d"], DEFAULT_PVALUE);
        assert_eq!(g, Generalizer::Any);
        assert_eq!(Generalizer::fit::<&str>(&[], DEFAULT_PVALUE), Generalizer::Any);
    }

    #[test]
    fn test_affixes_and_lengths() {
        let pool = ["ab", "ab", "ab", "ba", "ba", "ba", "ab", "ba", "a", "b"];
        let g = Generalizer::fit(&pool, DEFAULT_PVALUE);
        assert_eq!(
            g,
            Generalizer::Constrained {
                suffixes: set(&["a", "b"]),
                prefixes: set(&["a", "b"]),
                lengths: Some((1, 2)),
            }
        );
        assert_eq!(g.to_string(), "^(a|b).*(a|b)$ {1,2}");
        assert_eq!(g.specificity("ab"), Some(2));
        assert_eq!(g.specificity("abc"), None);
        assert_eq!(g.specificity("c"), None);
    }

    #[test]
    fn test_any_rejects_empty() {
        assert_eq!(Generalizer::Any.specificity("xyz"), Some(0));
        assert_eq!(Generalizer::Any.specificity(""), None);
    }

    #[test]
    fn test_length_only_constraint() {
        let g = Generalizer::Constrained {
            suffixes: BTreeSet::new(),
            prefixes: BTreeSet::new(),
            lengths: Some((2, 3)),
        };
        assert_eq!(g.specificity("ab"), Some(0));
        assert_eq!(g.specificity("abcd"), None);
        assert!(g.matches("abc"));
    }
}
