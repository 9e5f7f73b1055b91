//! Character n-gram models over the observed values of a variable slot.

use std::collections::{BTreeSet, HashMap};

/// Score given to any string by a model trained on nothing.
pub const UNTRAINED_SCORE: f64 = -100.0;

const PAD: char = '#';

/// Additively smoothed character n-gram model.
///
/// Strings are padded with `order - 1` leading `#` and one trailing `#`.
#[derive(Debug, Clone)]
pub struct StringNgram {
    order: usize,
    prior: f64,
    alphabet: BTreeSet<char>,
    counts: HashMap<String, usize>,
    trained: bool,
}

impl StringNgram {
    /// Train on `strings`. The alphabet is the set of padded training
    /// characters, extended with `alphabet` when given. An order below 1
    /// is treated as 1.
    pub fn new<S: AsRef<str>>(
        strings: &[S],
        alphabet: Option<&BTreeSet<char>>,
        order: usize,
        prior: f64,
    ) -> Self {
        let order = order.max(1);
        let padded: Vec<Vec<char>> = strings.iter().map(|s| pad(s.as_ref(), order)).collect();

        let mut symbols: BTreeSet<char> = padded.iter().flatten().copied().collect();
        if let Some(extra) = alphabet {
            symbols.extend(extra.iter().copied());
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in &padded {
            for gram in letter_ngrams(word, order) {
                *counts.entry(gram).or_insert(0) += 1;
            }
            if order == 1 {
                // The empty context precedes every unigram
                *counts.entry(String::new()).or_insert(0) += word.len();
            } else {
                for gram in letter_ngrams(word, order - 1) {
                    *counts.entry(gram).or_insert(0) += 1;
                }
            }
        }

        Self {
            order,
            prior,
            alphabet: symbols,
            counts,
            trained: !strings.is_empty(),
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Log-probability of `s` under the model.
    pub fn evaluate(&self, s: &str) -> f64 {
        if !self.trained {
            return UNTRAINED_SCORE;
        }
        let padded = pad(s, self.order);
        letter_ngrams(&padded, self.order)
            .map(|gram| self.log_prob(&gram))
            .sum()
    }

    fn log_prob(&self, gram: &str) -> f64 {
        let context_end = gram.char_indices().last().map_or(0, |(i, _)| i);
        let context = &gram[..context_end];

        let numerator = self.count(gram) as f64 + self.prior;
        let denominator = self.count(context) as f64 + self.alphabet.len() as f64 * self.prior;
        (numerator / denominator).ln()
    }

    fn count(&self, gram: &str) -> usize {
        self.counts.get(gram).copied().unwrap_or(0)
    }
}

fn pad(s: &str, order: usize) -> Vec<char> {
    std::iter::repeat(PAD)
        .take(order - 1)
        .chain(s.chars())
        .chain(std::iter::once(PAD))
        .collect()
}

fn letter_ngrams(word: &[char], n: usize) -> impl Iterator<Item = String> + '_ {
    let word = if n == 0 { &word[..0] } else { word };
    word.windows(n.max(1)).map(|w| w.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_ngrams() {
        let word: Vec<char> = "#ab#".chars().collect();
        let grams: Vec<String> = letter_ngrams(&word, 2).collect();
        assert_eq!(grams, vec!["#a", "ab", "b#"]);
        assert_eq!(letter_ngrams(&word, 5).count(), 0);
        assert_eq!(letter_ngrams(&word, 0).count(), 0);
    }

    #[test]
    fn test_padding() {
        let padded: String = pad("ab", 3).into_iter().collect();
        assert_eq!(padded, "##ab#");
    }

    #[test]
    fn test_seen_strings_score_higher() {
        let model = StringNgram::new(&["st", "b", "st", "gr"], None, 3, 0.01);
        assert!(model.evaluate("st") > model.evaluate("xq"));
        assert!(model.evaluate("st") < 0.0);
    }

    #[test]
    fn test_bigram_probability() {
        // Padded: "#a#", bigrams "#a", "a#"; unigram contexts "#", "a", "#"
        let model = StringNgram::new(&["a"], None, 2, 1.0);
        assert_eq!(model.alphabet_size(), 2);
        let expected = (2.0f64 / 4.0).ln() + (2.0f64 / 3.0).ln();
        assert!((model.evaluate("a") - expected).abs() < 1e-12);
    }

    #[test]
    fn test_external_alphabet_widens_denominator() {
        let extra: BTreeSet<char> = "xyz".chars().collect();
        let narrow = StringNgram::new(&["a"], None, 2, 0.5);
        let wide = StringNgram::new(&["a"], Some(&extra), 2, 0.5);
        assert_eq!(wide.alphabet_size(), 5);
        assert!(wide.evaluate("a") < narrow.evaluate("a"));
    }

    #[test]
    fn test_unigram_model() {
        let model = StringNgram::new(&["aa"], None, 1, 1.0);
        // Tokens "a", "a", "#": p(a) = (2+1)/(3+2)
        let expected = 2.0 * (3.0f64 / 5.0).ln() + (2.0f64 / 5.0).ln();
        assert!((model.evaluate("aa") - expected).abs() < 1e-12);
    }

    #[test]
    fn test_untrained_model() {
        let model = StringNgram::new::<&str>(&[], None, 3, 0.01);
        assert!(!model.is_trained());
        assert_eq!(model.evaluate("anything"), UNTRAINED_SCORE);
    }
}
