//! Inflection tables for words a paradigm was learned from.

use crate::models::Msd;
use crate::paradigm::{Paradigm, ParadigmError};

/// A generated table of one known member.
#[derive(Debug, Clone)]
pub struct Inflection<'a> {
    pub paradigm: &'a Paradigm,
    /// The stored variable values of the member
    pub variables: Vec<String>,
    pub table: Vec<(String, Msd)>,
}

/// Instantiate every stored binding of `member`.
///
/// A member learned into several paradigms (or several times into one)
/// yields one table per binding, in corpus order.
pub fn inflect_member<'a>(paradigms: &'a [Paradigm], member: &str) -> Result<Vec<Inflection<'a>>, ParadigmError> {
    let mut inflections = Vec::new();
    for p in paradigms {
        for (binding, name) in p.bindings().iter().zip(p.members()) {
            if name != member {
                continue;
            }
            inflections.push(Inflection {
                paradigm: p,
                variables: binding.values.clone(),
                table: p.instantiate(&binding.values)?,
            });
        }
    }
    Ok(inflections)
}

/// Tables for any of several alternative member names, e.g. `bad|bad..nn.1`.
pub fn inflect_any<'a>(paradigms: &'a [Paradigm], members: &[String]) -> Result<Vec<Inflection<'a>>, ParadigmError> {
    let mut inflections = Vec::new();
    for member in members {
        inflections.extend(inflect_member(paradigms, member)?);
    }
    Ok(inflections)
}
