//! Analysis of unseen words against learned paradigms.
//!
//! Candidate paradigms are found by matching every query word against the
//! paradigm forms and intersecting the variable assignments the words
//! allow. Each surviving assignment is scored by the paradigm's frequency
//! prior plus character n-gram models of its variable slots.

use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::models::{Msd, ParserParams, Query};
use crate::ngram::{StringNgram, UNTRAINED_SCORE};
use crate::paradigm::{Paradigm, Slot};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("n-gram order must be at least 1, got {0}")]
    InvalidOrder(usize),
    #[error("n-gram prior must be positive, got {0}")]
    InvalidPrior(f64),
}

/// Slot models of one paradigm.
#[derive(Debug, Clone)]
pub enum SlotModels {
    /// One model per variable, in variable order
    Trained(Vec<StringNgram>),
    /// The paradigm has variables but no bindings to learn from
    Unavailable,
}

impl SlotModels {
    /// Summed log-probability of `values` under the slot models.
    pub fn evaluate(&self, values: &[String]) -> f64 {
        match self {
            SlotModels::Unavailable => UNTRAINED_SCORE,
            SlotModels::Trained(models) => values
                .iter()
                .zip(models)
                .map(|(v, m)| m.evaluate(v))
                .sum(),
        }
    }
}

static UNAVAILABLE: SlotModels = SlotModels::Unavailable;

/// A paradigm corpus ready for analysis.
#[derive(Debug, Clone)]
pub struct ParserModel {
    pub paradigms: Vec<Paradigm>,
    pub num_examples: usize,
    pub alphabet: BTreeSet<char>,
    slot_models: HashMap<String, SlotModels>,
}

impl ParserModel {
    /// Train slot models for every paradigm, keyed by uuid.
    pub fn build(paradigms: Vec<Paradigm>, ngram_order: usize, ngram_prior: f64) -> Result<Self, ParserError> {
        if ngram_order == 0 {
            return Err(ParserError::InvalidOrder(ngram_order));
        }
        if !(ngram_prior > 0.0) {
            return Err(ParserError::InvalidPrior(ngram_prior));
        }

        let alphabet = paradigm_alphabet(&paradigms);
        let num_examples = paradigms.iter().map(Paradigm::count).sum();

        let slot_models = paradigms
            .par_iter()
            .map(|p| {
                let models = slot_models_for(p, &alphabet, ngram_order, ngram_prior);
                (p.uuid().to_string(), models)
            })
            .collect();

        Ok(Self {
            paradigms,
            num_examples,
            alphabet,
            slot_models,
        })
    }

    /// Build from parameters, shrinking the paradigms when `params.small` is set.
    pub fn from_params(paradigms: Vec<Paradigm>, params: &ParserParams) -> Result<Self, ParserError> {
        let mut model = Self::build(paradigms, params.ngram_order, params.ngram_prior)?;
        if params.small {
            model.shrink();
        }
        Ok(model)
    }

    /// Drop bindings and members of every paradigm. The trained slot
    /// models and the example count are kept, so scores do not change.
    pub fn shrink(&mut self) {
        for p in &mut self.paradigms {
            p.shrink();
        }
    }

    pub fn slot_models(&self, paradigm: &Paradigm) -> &SlotModels {
        self.slot_models.get(paradigm.uuid()).unwrap_or(&UNAVAILABLE)
    }

    /// Ranked analyses of `query` over the whole corpus.
    pub fn analyze(&self, query: &Query, params: &ParserParams) -> Vec<Analysis<'_>> {
        test_paradigms(query, self, params.prior_weight, params.match_all, params.baseform)
    }

    /// Ranked analyses of `query` over the paradigms that list one of
    /// `members`.
    pub fn analyze_member(&self, query: &Query, members: &[String], params: &ParserParams) -> Vec<Analysis<'_>> {
        test_member_paradigms(query, self, members, params.prior_weight, params.match_all, params.baseform)
    }
}

/// Every character seen in any slot, except the `_` placeholder.
pub fn paradigm_alphabet(paradigms: &[Paradigm]) -> BTreeSet<char> {
    paradigms
        .iter()
        .flat_map(|p| p.slots())
        .flat_map(|slot| slot.strings())
        .flat_map(|s| s.chars())
        .filter(|&c| c != '_')
        .collect()
}

fn slot_models_for(p: &Paradigm, alphabet: &BTreeSet<char>, order: usize, prior: f64) -> SlotModels {
    if p.num_vars() > 0 && p.count() == 0 {
        return SlotModels::Unavailable;
    }
    let models = p
        .slots()
        .iter()
        .filter_map(|slot| match slot {
            Slot::Variable(values) => Some(StringNgram::new(values, Some(alphabet), order, prior)),
            Slot::Fixed(_) => None,
        })
        .collect();
    SlotModels::Trained(models)
}

/// One scored reading of a query.
#[derive(Debug, Clone)]
pub struct Analysis<'a> {
    pub score: f64,
    pub paradigm: &'a Paradigm,
    /// Variable values, `variables[i - 1]` for variable `i`
    pub variables: Vec<String>,
}

type Assignment = Vec<Option<String>>;

/// Variable assignments consistent with every word at once.
///
/// Each word contributes the assignments of every cell it matches
/// (unconstrained); a tag restricts the word to cells with that MSD, and
/// with `baseform` an untagged first word must match the first form.
/// Assignments are joined across words on shared variables, and only
/// complete ones are returned. A paradigm without variables yields the
/// single empty assignment when every word matches.
pub fn eval_multiple_entries(p: &Paradigm, words: &[String], tags: &[Msd], baseform: bool) -> BTreeSet<Vec<String>> {
    let num_vars = p.num_vars();
    let mut joined: Option<BTreeSet<Assignment>> = None;

    for (ix, word) in words.iter().enumerate() {
        let tag = tags.get(ix);
        let restrict = tag.is_none() && ix == 0 && baseform;

        let mut found: BTreeSet<Assignment> = BTreeSet::new();
        for (form_index, result) in p.match_word(word, None, false, tag, restrict) {
            let Some(matches) = result else {
                continue;
            };
            if matches.is_empty() {
                found.insert(vec![None; num_vars]);
            }
            let form = &p.forms()[form_index];
            for m in matches {
                found.insert(form.assignment(&m.captures, num_vars));
            }
        }

        let next = match joined {
            None => found,
            Some(previous) => join(&previous, &found),
        };
        if next.is_empty() {
            return BTreeSet::new();
        }
        joined = Some(next);
    }

    joined
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.into_iter().collect::<Option<Vec<String>>>())
        .collect()
}

fn join(left: &BTreeSet<Assignment>, right: &BTreeSet<Assignment>) -> BTreeSet<Assignment> {
    let mut out = BTreeSet::new();
    for a in left {
        for b in right {
            if let Some(merged) = unify(a, b) {
                out.insert(merged);
            }
        }
    }
    out
}

fn unify(a: &Assignment, b: &Assignment) -> Option<Assignment> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x != y => None,
            (Some(x), _) => Some(Some(x.clone())),
            (None, y) => Some(y.clone()),
        })
        .collect()
}

/// Captures of `word` in the first cell it matches.
///
/// With `possible_tags`, the tags are tried in order and the first one
/// with a matching cell wins; without, only the first form is tried.
/// Captures are in template order; a cell without variables gives an
/// empty list.
pub fn eval_baseform(p: &Paradigm, word: &str, possible_tags: &[Msd]) -> Option<Vec<String>> {
    let first_capture = |tag: Option<&Msd>| {
        p.match_word(word, None, false, tag, tag.is_none())
            .into_iter()
            .filter_map(|(_, result)| result)
            .find_map(|matches| match matches.first() {
                Some(m) => Some(m.captures.clone()),
                None => Some(Vec::new()),
            })
    };

    if possible_tags.is_empty() {
        first_capture(None)
    } else {
        possible_tags.iter().find_map(|t| first_capture(Some(t)))
    }
}

/// Log of the paradigm's share of all training tables, 0 when undefined.
pub fn log_prior(p: &Paradigm, num_examples: usize) -> f64 {
    if p.count() == 0 || num_examples == 0 {
        return 0.0;
    }
    (p.count() as f64 / num_examples as f64).ln()
}

/// Score every consistent assignment of `words` in one paradigm.
///
/// With `match_table`, only assignments whose full instantiation equals
/// the table are kept.
#[allow(clippy::too_many_arguments)]
pub fn test_paradigm<'a>(
    p: &'a Paradigm,
    words: &[String],
    num_examples: usize,
    prior_weight: f64,
    slot_models: &SlotModels,
    tags: &[Msd],
    match_table: Option<&[(String, Msd)]>,
    baseform: bool,
) -> Vec<Analysis<'a>> {
    let assignments = eval_multiple_entries(p, words, tags, baseform);
    score_assignments(
        p,
        assignments,
        words.len(),
        num_examples,
        prior_weight,
        slot_models,
        match_table,
    )
}

fn score_assignments<'a>(
    p: &'a Paradigm,
    assignments: BTreeSet<Vec<String>>,
    num_words: usize,
    num_examples: usize,
    prior_weight: f64,
    slot_models: &SlotModels,
    match_table: Option<&[(String, Msd)]>,
) -> Vec<Analysis<'a>> {
    let prior = log_prior(p, num_examples);

    let mut analyses: Vec<Analysis<'a>> = assignments
        .into_iter()
        .map(|variables| {
            let score = if p.num_vars() == 0 {
                prior
            } else {
                prior * prior_weight + num_words as f64 * slot_models.evaluate(&variables)
            };
            Analysis {
                score,
                paradigm: p,
                variables,
            }
        })
        .collect();

    if let Some(table) = match_table {
        analyses.retain(|a| p.instantiate(&a.variables).map_or(false, |t| t == table));
    }
    analyses
}

/// Rank every paradigm of the model against a query.
///
/// Paradigms are first screened by an unconstrained fit of every word,
/// then by a non-empty assignment intersection. Results are sorted by
/// descending score; ties keep corpus order.
pub fn test_paradigms<'a>(
    query: &Query,
    model: &'a ParserModel,
    prior_weight: f64,
    match_all: bool,
    baseform: bool,
) -> Vec<Analysis<'a>> {
    let words = query.word_list();
    let tags = query.tags();
    let candidates = model.paradigms.par_iter().filter(|p| {
        words
            .iter()
            .enumerate()
            .all(|(i, w)| p.fits(w, tags.get(i), false, false))
    });
    rank(candidates, query, model, prior_weight, match_all, baseform)
}

/// Rank the paradigms learned from one of `members` against a query.
///
/// The fit screen is skipped; a paradigm still needs a non-empty
/// assignment intersection to be reported.
pub fn test_member_paradigms<'a>(
    query: &Query,
    model: &'a ParserModel,
    members: &[String],
    prior_weight: f64,
    match_all: bool,
    baseform: bool,
) -> Vec<Analysis<'a>> {
    let candidates = model
        .paradigms
        .par_iter()
        .filter(|p| p.members().iter().any(|m| members.contains(m)));
    rank(candidates, query, model, prior_weight, match_all, baseform)
}

fn rank<'a, I>(
    candidates: I,
    query: &Query,
    model: &'a ParserModel,
    prior_weight: f64,
    match_all: bool,
    baseform: bool,
) -> Vec<Analysis<'a>>
where
    I: ParallelIterator<Item = &'a Paradigm>,
{
    let words = query.word_list();
    if words.is_empty() {
        return Vec::new();
    }
    let tags = query.tags();

    let match_table: Option<Vec<(String, Msd)>> = (match_all && !tags.is_empty())
        .then(|| words.iter().cloned().zip(tags.iter().cloned()).collect());

    let mut analyses: Vec<Analysis<'a>> = candidates
        .flat_map_iter(|p| {
            let assignments = eval_multiple_entries(p, words, tags, baseform);
            score_assignments(
                p,
                assignments,
                words.len(),
                model.num_examples,
                prior_weight,
                model.slot_models(p),
                match_table.as_deref(),
            )
        })
        .collect();

    analyses.sort_by(|a, b| b.score.total_cmp(&a.score));
    analyses
}
