//! Bracketing of word forms around a longest common subsequence.
//!
//! A bracketing marks which characters of a word belong to the LCS: runs
//! of matched characters become variable parts, everything else is fixed
//! text. `find_factors` enumerates every bracketing of a word, and
//! `eval_factors` splits the LCS into the variables shared by a chosen
//! combination of bracketings.

use crate::paradigm::{Template, Token};
use std::fmt;

/// A run of fixed text or of characters belonging to the LCS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Part {
    Fixed(String),
    Var(String),
}

/// One way of aligning a word with an LCS, displayed as `[st]a[d]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bracketing {
    parts: Vec<Part>,
}

impl Bracketing {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The underlying word, brackets removed.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| match p {
                Part::Fixed(s) | Part::Var(s) => s.as_str(),
            })
            .collect()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Var(s) => Some(s.as_str()),
            Part::Fixed(_) => None,
        })
    }

    /// Length of the display form, brackets included.
    pub fn bracketed_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match p {
                Part::Fixed(s) => s.chars().count(),
                Part::Var(s) => s.chars().count() + 2,
            })
            .sum()
    }

    /// Number of fixed characters between the first and the last variable.
    ///
    /// Zero when there is no variable or the word contains `@`.
    pub fn infix_count(&self) -> usize {
        if self.text().contains('@') {
            return 0;
        }
        let var_positions: Vec<usize> = self
            .parts
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, Part::Var(_)))
            .map(|(i, _)| i)
            .collect();
        let (Some(&first), Some(&last)) = (var_positions.first(), var_positions.last()) else {
            return 0;
        };
        self.parts[first..=last]
            .iter()
            .map(|p| match p {
                Part::Fixed(s) => s.chars().count(),
                Part::Var(_) => 0,
            })
            .sum()
    }

    /// Length of the longest variable part.
    pub fn longest_variable(&self) -> usize {
        self.variables().map(|v| v.chars().count()).max().unwrap_or(0)
    }

    /// Sum of the positions of every `[` in the display form.
    pub fn bracket_position_sum(&self) -> usize {
        let mut pos = 0;
        let mut sum = 0;
        for part in &self.parts {
            match part {
                Part::Fixed(s) => pos += s.chars().count(),
                Part::Var(s) => {
                    sum += pos;
                    pos += s.chars().count() + 2;
                }
            }
        }
        sum
    }

    /// True when the display form, past its first character, starts with
    /// `prefix`. For a word opening with `[` this compares the leading
    /// variable; a literal-initial word is compared from its second
    /// character on.
    pub fn shifted_starts_with(&self, prefix: &str) -> bool {
        let shown = self.to_string();
        shown
            .chars()
            .skip(1)
            .take(prefix.chars().count())
            .eq(prefix.chars())
    }

    fn push_fixed(&mut self, c: char) {
        match self.parts.last_mut() {
            Some(Part::Fixed(s)) => s.push(c),
            _ => self.parts.push(Part::Fixed(c.to_string())),
        }
    }

    fn open_var(&mut self, c: char) {
        self.parts.push(Part::Var(c.to_string()));
    }

    fn extend_var(&mut self, c: char) {
        match self.parts.last_mut() {
            Some(Part::Var(s)) => s.push(c),
            _ => self.open_var(c),
        }
    }
}

impl fmt::Display for Bracketing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                Part::Fixed(s) => write!(f, "{}", s)?,
                Part::Var(s) => write!(f, "[{}]", s)?,
            }
        }
        Ok(())
    }
}

struct Frame {
    word_pos: usize,
    lcs_pos: usize,
    in_match: bool,
    acc: Bracketing,
}

/// Every bracketing of `word` that consumes all of `lcs` in order.
///
/// Results are ordered as a depth-first search that tries to consume an
/// LCS character before treating it as fixed text.
pub fn find_factors(word: &str, lcs: &str) -> Vec<Bracketing> {
    let word: Vec<char> = word.chars().collect();
    let lcs: Vec<char> = lcs.chars().collect();
    let mut results = Vec::new();

    let mut stack = vec![Frame {
        word_pos: 0,
        lcs_pos: 0,
        in_match: false,
        acc: Bracketing::default(),
    }];

    while let Some(frame) = stack.pop() {
        let Frame {
            word_pos,
            lcs_pos,
            in_match,
            acc,
        } = frame;

        if word_pos == word.len() {
            if lcs_pos == lcs.len() {
                results.push(acc);
            }
            continue;
        }
        // Not enough characters left to finish the LCS
        if word.len() - word_pos < lcs.len() - lcs_pos {
            continue;
        }

        let c = word[word_pos];
        let mut fixed = acc.clone();
        fixed.push_fixed(c);
        let skip = Frame {
            word_pos: word_pos + 1,
            lcs_pos,
            in_match: false,
            acc: fixed,
        };

        if lcs_pos < lcs.len() && c == lcs[lcs_pos] {
            let mut matched = acc;
            if in_match {
                matched.extend_var(c);
            } else {
                matched.open_var(c);
            }
            // Pushed last so it is explored first
            stack.push(skip);
            stack.push(Frame {
                word_pos: word_pos + 1,
                lcs_pos: lcs_pos + 1,
                in_match: true,
                acc: matched,
            });
        } else {
            stack.push(skip);
        }
    }

    results
}

/// Split `lcs` into the variables induced by a combination of bracketings.
///
/// Every variable boundary in any of the bracketings becomes a boundary
/// in the result. Returns the number of variables and their values.
pub fn eval_factors(lcs: &str, combination: &[&Bracketing]) -> (usize, Vec<String>) {
    let lcs: Vec<char> = lcs.chars().collect();
    let mut breaks = vec![false; lcs.len()];

    for bracketing in combination {
        let mut pos = 0;
        for var in bracketing.variables() {
            pos += var.chars().count();
            if let Some(b) = pos.checked_sub(1).and_then(|i| breaks.get_mut(i)) {
                *b = true;
            }
        }
    }

    let mut variables = Vec::new();
    let mut current = String::new();
    for (c, &is_break) in lcs.iter().zip(&breaks) {
        current.push(*c);
        if is_break {
            variables.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        variables.push(current);
    }

    (variables.len(), variables)
}

/// Rewrite a bracketing as a template over the table's variables.
///
/// Each bracketed part is replaced by the consecutive variables that
/// cover it.
pub fn to_template(bracketing: &Bracketing, variables: &[String]) -> Template {
    let mut template = Vec::new();
    let mut next_var = 0;

    for part in bracketing.parts() {
        match part {
            Part::Fixed(s) => template.push(Token::Literal(s.clone())),
            Part::Var(s) => {
                let len = s.chars().count();
                let mut covered = 0;
                while covered < len && next_var < variables.len() {
                    covered += variables[next_var].chars().count();
                    next_var += 1;
                    template.push(Token::Var(next_var));
                }
            }
        }
    }

    template
}

/// Parse the display form (`[st]a[d]`) back into a bracketing.
#[cfg(test)]
pub(crate) fn parse_bracketing(s: &str) -> Bracketing {
    let mut b = Bracketing::default();
    let mut in_var = false;
    let mut fresh = false;
    for c in s.chars() {
        match c {
            '[' => {
                in_var = true;
                fresh = true;
            }
            ']' => in_var = false,
            c if in_var && fresh => {
                b.open_var(c);
                fresh = false;
            }
            c if in_var => b.extend_var(c),
            c => b.push_fixed(c),
        }
    }
    b
}
