//! Paradigm induction from inflection tables.
//!
//! For every table this finds the longest common subsequences of its
//! forms, enumerates the bracketings of each form around each LCS, prunes
//! the candidates, and keeps the combination with the fewest variables
//! (then the fewest infix characters). Structurally identical tables are
//! then merged into paradigms.

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::prelude::*;

use crate::bracket::{eval_factors, find_factors, to_template, Bracketing, Part};
use crate::filter::{filter_bracketings, FactorList, DEFAULT_FILTERS};
use crate::merge::merge_tables;
use crate::models::{InflectionTable, LearnParams};
use crate::paradigm::{Paradigm, ParadigmError, Template, Token};
use crate::wordgraph::longest_common_subsequences;

/// The chosen generalization of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCandidate {
    pub bracketings: Vec<Bracketing>,
    pub templates: Vec<Template>,
    pub variables: Vec<String>,
    pub num_vars: usize,
    pub infix_count: usize,
}

impl TableCandidate {
    /// A table sharing no material across its forms: every form is its
    /// own literal template.
    pub fn literal(table: &InflectionTable) -> Self {
        Self {
            bracketings: table
                .forms()
                .iter()
                .map(|w| Bracketing::new(vec![Part::Fixed(w.clone())]))
                .collect(),
            templates: table
                .forms()
                .iter()
                .map(|w| vec![Token::Literal(w.clone())])
                .collect(),
            variables: Vec::new(),
            num_vars: 0,
            infix_count: 0,
        }
    }

    fn cost(&self) -> (usize, usize) {
        (self.num_vars, self.infix_count)
    }
}

/// Pick the best bracketing combination for one table.
pub fn best_candidate(table: &InflectionTable, params: &LearnParams) -> TableCandidate {
    let mut best: Option<TableCandidate> = None;

    for lcs in longest_common_subsequences(table.forms()) {
        let factors: FactorList = table
            .forms()
            .iter()
            .map(|w| find_factors(w, &lcs))
            .collect();
        let factors = filter_bracketings(factors, &DEFAULT_FILTERS, params.table_limit);

        for combination in factors.iter().map(|f| f.iter()).multi_cartesian_product() {
            let (num_vars, variables) = eval_factors(&lcs, &combination);
            let infix_count = combination.iter().map(|b| b.infix_count()).sum();

            let better = best
                .as_ref()
                .map_or(true, |b| (num_vars, infix_count) < b.cost());
            if better {
                best = Some(TableCandidate {
                    templates: combination
                        .iter()
                        .map(|b| to_template(b, &variables))
                        .collect(),
                    bracketings: combination.into_iter().cloned().collect(),
                    variables,
                    num_vars,
                    infix_count,
                });
            }
        }
    }

    best.unwrap_or_else(|| TableCandidate::literal(table))
}

/// Learn paradigms from a list of inflection tables.
///
/// Tables are generalized in parallel; the output order follows the
/// first occurrence of each paradigm in `tables`.
pub fn learn_paradigms(
    tables: &[InflectionTable],
    params: &LearnParams,
    show_progress: bool,
) -> Result<Vec<Paradigm>, ParadigmError> {
    if show_progress {
        eprintln!("Generalizing {} tables...", tables.len());
    }

    let progress = if show_progress {
        let pb = ProgressBar::new(tables.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
        )
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let candidates: Vec<TableCandidate> = tables
        .par_iter()
        .map(|table| {
            let candidate = best_candidate(table, params);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
            candidate
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    if show_progress {
        eprintln!("Merging tables...");
    }
    let paradigms = merge_tables(tables, &candidates)?;

    if show_progress {
        eprintln!("  Paradigms: {}", paradigms.len());
    }
    Ok(paradigms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Msd;
    use crate::paradigm::format_template;

    fn noun_tags() -> Vec<Msd> {
        vec![
            Msd::single("msd", "sg indef nom"),
            Msd::single("msd", "pl indef nom"),
            Msd::single("msd", "sg indef gen"),
        ]
    }

    fn table(forms: &[&str]) -> InflectionTable {
        InflectionTable::from_strs(forms, &noun_tags()).unwrap()
    }

    #[test]
    fn test_best_candidate_stad() {
        let c = best_candidate(&table(&["stad", "städer", "stads"]), &LearnParams::default());
        assert_eq!(c.num_vars, 2);
        assert_eq!(c.variables, vec!["st", "d"]);
        let templates: Vec<String> = c.templates.iter().map(|t| format_template(t)).collect();
        assert_eq!(templates, vec!["1+a+2", "1+ä+2+er", "1+a+2+s"]);
        assert_eq!(c.infix_count, 3);
    }

    #[test]
    fn test_best_candidate_without_lcs() {
        let tags = vec![Msd::from_value("a"), Msd::from_value("b")];
        let t = InflectionTable::from_strs(&["xy", "z"], &tags).unwrap();
        let c = best_candidate(&t, &LearnParams::default());
        assert_eq!(c.num_vars, 0);
        assert!(c.variables.is_empty());
        let templates: Vec<String> = c.templates.iter().map(|t| format_template(t)).collect();
        assert_eq!(templates, vec!["xy", "z"]);
    }

    #[test]
    fn test_learn_single_table() {
        let paradigms =
            learn_paradigms(&[table(&["stad", "städer", "stads"])], &LearnParams::default(), false)
                .unwrap();
        assert_eq!(paradigms.len(), 1);
        let p = &paradigms[0];
        assert_eq!(p.count(), 1);
        assert_eq!(p.bindings()[0].values, vec!["st", "d"]);
        assert_eq!(p.bindings()[0].identifier.as_deref(), Some("stad"));
    }

    #[test]
    fn test_learn_merges_identical_shapes() {
        let tables = vec![
            table(&["stad", "städer", "stads"]),
            table(&["bad", "bäder", "bads"]),
            table(&["bord", "bord", "bords"]),
        ];
        let paradigms = learn_paradigms(&tables, &LearnParams::default(), false).unwrap();
        assert_eq!(paradigms.len(), 2);
        assert_eq!(paradigms[0].count(), 2);
        assert_eq!(paradigms[0].members(), &["stad".to_string(), "bad".to_string()]);
        assert_eq!(paradigms[1].count(), 1);
        assert_eq!(paradigms[1].pattern(), "1::msd=sg indef nom#1::msd=pl indef nom#1+s::msd=sg indef gen");
    }

    #[test]
    fn test_learn_is_deterministic() {
        let tables = vec![
            table(&["stad", "städer", "stads"]),
            table(&["bad", "bäder", "bads"]),
        ];
        let a = learn_paradigms(&tables, &LearnParams::default(), false).unwrap();
        let b = learn_paradigms(&tables, &LearnParams::default(), false).unwrap();
        let shown = |ps: &[Paradigm]| ps.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        assert_eq!(shown(&a), shown(&b));
    }
}
