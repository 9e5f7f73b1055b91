//! Merge generalized tables into paradigms.
//!
//! Tables whose templates and tag sequences are identical describe the
//! same inflection pattern; they are collapsed into a single paradigm
//! carrying one variable binding per table.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::extract::TableCandidate;
use crate::models::{InflectionTable, Msd};
use crate::paradigm::{Binding, Paradigm, ParadigmError, Template};

/// Collapse tables with identical templates and tags.
///
/// Paradigms appear in order of their first table, bindings in table
/// order, each identified by its table's first form.
pub fn merge_tables(
    tables: &[InflectionTable],
    candidates: &[TableCandidate],
) -> Result<Vec<Paradigm>, ParadigmError> {
    let mut groups: Vec<(usize, Vec<Binding>)> = Vec::new();
    let mut index: HashMap<(&[Template], &[Msd]), usize> = HashMap::new();

    for (i, (table, candidate)) in tables.iter().zip(candidates).enumerate() {
        let binding = Binding::with_identifier(table.baseform(), candidate.variables.clone());
        match index.entry((candidate.templates.as_slice(), table.tags())) {
            Entry::Occupied(e) => groups[*e.get()].1.push(binding),
            Entry::Vacant(e) => {
                e.insert(groups.len());
                groups.push((i, vec![binding]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(first, bindings)| {
            let forms = candidates[first]
                .templates
                .iter()
                .cloned()
                .zip(tables[first].tags().iter().cloned())
                .collect();
            Paradigm::new(forms, bindings)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::best_candidate;
    use crate::models::LearnParams;

    fn tables(rows: &[(&[&str], &[&str])]) -> Vec<InflectionTable> {
        rows.iter()
            .map(|(forms, tags)| {
                let tags: Vec<Msd> = tags.iter().map(|t| Msd::from_value(*t)).collect();
                InflectionTable::from_strs(forms, &tags).unwrap()
            })
            .collect()
    }

    fn merged(tables: &[InflectionTable]) -> Vec<Paradigm> {
        let candidates: Vec<TableCandidate> = tables
            .iter()
            .map(|t| best_candidate(t, &LearnParams::default()))
            .collect();
        merge_tables(tables, &candidates).unwrap()
    }

    #[test]
    fn test_same_shape_merges() {
        let ts = tables(&[
            (&["katt", "katter"], &["sg", "pl"]),
            (&["hatt", "hatter"], &["sg", "pl"]),
        ]);
        let ps = merged(&ts);
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].count(), 2);
        assert_eq!(ps[0].bindings()[1].to_string(), "first-attest=hatt,,1=hatt");
    }

    #[test]
    fn test_different_tags_do_not_merge() {
        let ts = tables(&[
            (&["katt", "katter"], &["sg", "pl"]),
            (&["hatt", "hatter"], &["sg", "pl def"]),
        ]);
        assert_eq!(merged(&ts).len(), 2);
    }

    #[test]
    fn test_literal_tables_keep_identifier() {
        let ts = tables(&[(&["go", "went"], &["inf", "past"])]);
        let ps = merged(&ts);
        assert_eq!(ps[0].num_vars(), 0);
        assert_eq!(ps[0].members(), &["go".to_string()]);
        assert_eq!(ps[0].to_string(), "go::inf#went::past\tfirst-attest=go");
    }
}
