//! Subsequence automata for longest-common-subsequence extraction.
//!
//! A word becomes a deterministic automaton that accepts every subsequence
//! of the word (all states are final). Intersecting the automata of all
//! forms in a table and reading off the longest paths yields the set of
//! longest common subsequences.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Deterministic automaton over characters, state 0 is initial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordGraph {
    transitions: BTreeMap<(usize, char), usize>,
}

impl WordGraph {
    /// Build the subsequence automaton of a word.
    ///
    /// From state `i` a character jumps to one past its first occurrence
    /// at or after position `i`.
    pub fn from_word(word: &str) -> Self {
        let chars: Vec<char> = word.chars().collect();
        let mut transitions = BTreeMap::new();

        for i in 0..chars.len() {
            for (j, &c) in chars.iter().enumerate().skip(i) {
                transitions.entry((i, c)).or_insert(j + 1);
            }
        }

        Self { transitions }
    }

    pub fn transition(&self, state: usize, symbol: char) -> Option<usize> {
        self.transitions.get(&(state, symbol)).copied()
    }

    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions.keys().map(|&(_, c)| c).collect()
    }

    pub fn states(&self) -> BTreeSet<usize> {
        self.transitions
            .iter()
            .flat_map(|(&(source, _), &target)| [source, target])
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Product automaton accepting the strings both automata accept.
    ///
    /// States are numbered in discovery order from the pair (0, 0).
    pub fn intersect(&self, other: &WordGraph) -> WordGraph {
        let alphabet: Vec<char> = self
            .alphabet()
            .intersection(&other.alphabet())
            .copied()
            .collect();

        let mut state_map: HashMap<(usize, usize), usize> = HashMap::from([((0, 0), 0)]);
        let mut stack = vec![(0usize, 0usize)];
        let mut transitions = BTreeMap::new();

        while let Some(pair) = stack.pop() {
            let source = state_map[&pair];
            for &symbol in &alphabet {
                let (Some(a), Some(b)) = (
                    self.transition(pair.0, symbol),
                    other.transition(pair.1, symbol),
                ) else {
                    continue;
                };
                let next_id = state_map.len();
                let target = *state_map.entry((a, b)).or_insert_with(|| {
                    stack.push((a, b));
                    next_id
                });
                transitions.insert((source, symbol), target);
            }
        }

        WordGraph { transitions }
    }

    /// All strings spelled by maximum-length paths from the initial state.
    pub fn longest_words(&self) -> Vec<String> {
        if self.transitions.is_empty() {
            return Vec::new();
        }

        let mut successors: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        let mut predecessors: BTreeMap<usize, Vec<(usize, char)>> = BTreeMap::new();
        for (&(source, symbol), &target) in &self.transitions {
            successors.entry(source).or_default().insert(target);
            predecessors.entry(target).or_default().push((source, symbol));
        }
        for preds in predecessors.values_mut() {
            preds.sort_unstable();
        }

        // Longest distance from the start, raised level by level
        let mut depth: HashMap<usize, usize> = self.states().into_iter().map(|s| (s, 0)).collect();
        let mut frontier = BTreeSet::from([0usize]);
        let mut step = 1;
        while !frontier.is_empty() {
            let mut next = BTreeSet::new();
            for state in &frontier {
                let Some(targets) = successors.get(state) else {
                    continue;
                };
                for &target in targets {
                    let d = depth.entry(target).or_insert(0);
                    if *d < step {
                        *d = step;
                        next.insert(target);
                    }
                }
            }
            frontier = next;
            step += 1;
        }

        let max_depth = depth.values().copied().max().unwrap_or(0);
        let ends: BTreeSet<usize> = depth
            .iter()
            .filter(|&(_, &d)| d == max_depth)
            .map(|(&s, _)| s)
            .collect();

        let mut words = Vec::new();
        for end in ends {
            let mut stack: Vec<(usize, Vec<char>)> = vec![(end, Vec::new())];
            while let Some((state, suffix)) = stack.pop() {
                let Some(preds) = predecessors.get(&state) else {
                    words.push(suffix.iter().rev().collect());
                    continue;
                };
                let level = depth.get(&state).copied().unwrap_or(0);
                for &(prev, symbol) in preds.iter().rev() {
                    if depth.get(&prev).copied().unwrap_or(0) + 1 == level {
                        let mut extended = suffix.clone();
                        extended.push(symbol);
                        stack.push((prev, extended));
                    }
                }
            }
        }

        words
    }
}

/// The longest common subsequences of a list of words.
///
/// Empty when the words share no character or the list is empty.
pub fn longest_common_subsequences<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    let mut graphs = words.iter().map(|w| WordGraph::from_word(w.as_ref()));
    let Some(first) = graphs.next() else {
        return Vec::new();
    };
    graphs.fold(first, |acc, g| acc.intersect(&g)).longest_words()
}
