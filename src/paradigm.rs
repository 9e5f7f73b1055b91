//! Generalized inflection paradigms.
//!
//! A paradigm is a list of forms, each a template of literal text and
//! numbered variables tagged with an MSD, plus the variable bindings of
//! the tables it was learned from. Instantiating every template with one
//! binding reproduces that table. Matching runs the other way: a word is
//! decomposed against a template to recover candidate variable values.

use crate::generalize::{Generalizer, DEFAULT_PVALUE};
use crate::models::Msd;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParadigmError {
    #[error("paradigm has no forms")]
    NoForms,
    #[error("form has an empty template")]
    EmptyTemplate,
    #[error("invalid template {0:?}")]
    InvalidTemplate(String),
    #[error("variables must be numbered 1..={expected}, found {found:?}")]
    NonContiguousVariables { expected: usize, found: Vec<usize> },
    #[error("binding {binding} has {found} values, paradigm has {expected} variables")]
    BindingArity {
        binding: usize,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} variable values, got {found}")]
    ValueCount { expected: usize, found: usize },
    #[error("invalid binding {0:?}")]
    InvalidBinding(String),
}

// ============================================================================
// Templates
// ============================================================================

/// One piece of a form template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    Literal(String),
    /// 1-based variable index
    Var(usize),
}

pub type Template = Vec<Token>;

const ESCAPE: char = '\\';
const RESERVED: [char; 4] = ['\\', '+', '#', ':'];

/// Parse the `+`-joined text form, e.g. `1+ä+2+er`.
///
/// A piece made only of ASCII digits is a variable. A `\` escapes the
/// next character of a literal.
pub fn parse_template(s: &str) -> Result<Template, ParadigmError> {
    if s.is_empty() {
        return Err(ParadigmError::EmptyTemplate);
    }
    let mut template = Vec::new();
    for piece in split_unescaped(s, '+').into_iter().filter(|p| !p.is_empty()) {
        if piece.bytes().all(|b| b.is_ascii_digit()) {
            match piece.parse::<usize>() {
                Ok(index) if index > 0 => template.push(Token::Var(index)),
                _ => return Err(ParadigmError::InvalidTemplate(s.to_string())),
            }
        } else {
            template.push(Token::Literal(unescape(piece)));
        }
    }
    if template.is_empty() {
        return Err(ParadigmError::EmptyTemplate);
    }
    Ok(template)
}

/// Inverse of [`parse_template`]. Literals that would read back as a
/// variable or that contain `\`, `+`, `#` or `:` are escaped.
pub fn format_template(template: &[Token]) -> String {
    template
        .iter()
        .map(|t| match t {
            Token::Literal(s) => escape_literal(s),
            Token::Var(i) => i.to_string(),
        })
        .collect::<Vec<_>>()
        .join("+")
}

fn escape_literal(s: &str) -> String {
    let numeric = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let mut out = String::with_capacity(s.len() + 1);
    for (i, c) in s.chars().enumerate() {
        if RESERVED.contains(&c) || (numeric && i == 0) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}

/// Split on every `sep` not escaped by a preceding `\`.
pub(crate) fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Split a stored form `template::msd` at its first unescaped `::`.
/// A form without one has an empty MSD.
pub(crate) fn split_form(s: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut colon: Option<usize> = None;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            colon = None;
            continue;
        }
        match c {
            ESCAPE => {
                escaped = true;
                colon = None;
            }
            ':' => match colon {
                Some(first) => return (&s[..first], &s[i + 1..]),
                None => colon = Some(i),
            },
            _ => colon = None,
        }
    }
    (s, "")
}

// ============================================================================
// Bindings and slots
// ============================================================================

/// Variable values of one training table.
///
/// `values[i - 1]` binds variable `i`; the identifier is the table's
/// citation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    pub identifier: Option<String>,
    pub values: Vec<String>,
}

impl Binding {
    pub fn new(values: Vec<String>) -> Self {
        Self {
            identifier: None,
            values,
        }
    }

    pub fn with_identifier(identifier: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            values,
        }
    }

    /// Build from `(slot, value)` pairs. Slot `first-attest` or `0` is the
    /// identifier, the numbered slots must be exactly `1..=n`.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ParadigmError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut identifier = None;
        let mut values = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            if key == "first-attest" || key == "0" {
                identifier = Some(value.into());
                continue;
            }
            let index: usize = key
                .parse()
                .map_err(|_| ParadigmError::InvalidBinding(key.to_string()))?;
            if values.insert(index, value.into()).is_some() {
                return Err(ParadigmError::InvalidBinding(format!("duplicate slot {}", key)));
            }
        }

        if !values.keys().copied().eq(1..=values.len()) {
            return Err(ParadigmError::NonContiguousVariables {
                expected: values.len(),
                found: values.keys().copied().collect(),
            });
        }

        Ok(Self {
            identifier,
            values: values.into_values().collect(),
        })
    }

    /// Parse the stored form, e.g. `first-attest=stad,,1=st,,2=d`.
    pub fn parse(s: &str) -> Result<Self, ParadigmError> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        let pairs = s
            .split(",,")
            .map(|pair| {
                pair.split_once('=')
                    .ok_or_else(|| ParadigmError::InvalidBinding(pair.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairs(pairs)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs = Vec::with_capacity(self.values.len() + 1);
        if let Some(id) = &self.identifier {
            pairs.push(format!("first-attest={}", id));
        }
        for (i, v) in self.values.iter().enumerate() {
            pairs.push(format!("{}={}", i + 1, v));
        }
        write!(f, "{}", pairs.join(",,"))
    }
}

/// Content of one position of the paradigm's slot structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The literal at this position of every form, `_` when empty
    Fixed(Vec<String>),
    /// The observed values of one variable, one per binding
    Variable(Vec<String>),
}

impl Slot {
    pub fn is_variable(&self) -> bool {
        matches!(self, Slot::Variable(_))
    }

    pub fn strings(&self) -> &[String] {
        match self {
            Slot::Fixed(s) | Slot::Variable(s) => s,
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

static UNCONSTRAINED: Generalizer = Generalizer::Any;

/// One decomposition of a word against a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMatch {
    pub specificity: usize,
    /// Captured strings in template order
    pub captures: Vec<String>,
}

/// A word-form template with its MSD and compiled variable constraints.
#[derive(Debug, Clone)]
pub struct Form {
    template: Template,
    msd: Msd,
    literal_len: usize,
    variables: Vec<usize>,
    constraints: Vec<Generalizer>,
    // Minimum number of characters needed from each token to the end
    min_tail: Vec<usize>,
}

impl Form {
    /// `constraints[i - 1]` restricts variable `i`; missing entries match
    /// any non-empty string.
    pub fn new(template: Template, msd: Msd, constraints: Vec<Generalizer>) -> Result<Self, ParadigmError> {
        if template.is_empty() {
            return Err(ParadigmError::EmptyTemplate);
        }

        let literal_len = template
            .iter()
            .map(|t| match t {
                Token::Literal(s) => s.chars().count(),
                Token::Var(_) => 0,
            })
            .sum();
        let variables = template
            .iter()
            .filter_map(|t| match t {
                Token::Var(i) => Some(*i),
                Token::Literal(_) => None,
            })
            .collect();

        let mut min_tail = vec![0; template.len() + 1];
        for (i, token) in template.iter().enumerate().rev() {
            let need = match token {
                Token::Literal(s) => s.chars().count(),
                Token::Var(_) => 1,
            };
            min_tail[i] = min_tail[i + 1] + need;
        }

        Ok(Self {
            template,
            msd,
            literal_len,
            variables,
            constraints,
            min_tail,
        })
    }

    pub fn template(&self) -> &[Token] {
        &self.template
    }

    pub fn msd(&self) -> &Msd {
        &self.msd
    }

    /// Number of literal characters in the template.
    pub fn literal_len(&self) -> usize {
        self.literal_len
    }

    /// Variable indices in template order.
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    pub fn constraint(&self, index: usize) -> &Generalizer {
        index
            .checked_sub(1)
            .and_then(|i| self.constraints.get(i))
            .unwrap_or(&UNCONSTRAINED)
    }

    /// Fill the template with `values`, where `values[i - 1]` binds variable `i`.
    pub fn instantiate<S: AsRef<str>>(&self, values: &[S]) -> Result<String, ParadigmError> {
        let mut word = String::new();
        for token in &self.template {
            match token {
                Token::Literal(s) => word.push_str(s),
                Token::Var(i) => {
                    let value = i.checked_sub(1).and_then(|k| values.get(k)).ok_or(ParadigmError::ValueCount {
                        expected: self.variables.iter().copied().max().unwrap_or(0),
                        found: values.len(),
                    })?;
                    word.push_str(value.as_ref());
                }
            }
        }
        Ok(word)
    }

    /// Whether `word` fits this form, optionally restricted to one MSD.
    pub fn matches(&self, word: &str, tag: Option<&Msd>, constrained: bool) -> bool {
        if tag.map_or(false, |t| t != &self.msd) {
            return false;
        }
        self.match_vars(word, constrained).is_some()
    }

    /// Decompose `word` against the template.
    ///
    /// Returns `None` when the literal skeleton does not fit or, with
    /// `constrained`, when every decomposition violates a constraint;
    /// an empty list when the template has no variables; otherwise one
    /// entry per surviving decomposition, shortest first variable first.
    pub fn match_vars(&self, word: &str, constrained: bool) -> Option<Vec<FormMatch>> {
        let chars: Vec<char> = word.chars().collect();
        let decompositions = self.decompose(&chars);
        if decompositions.is_empty() {
            return None;
        }
        if self.variables.is_empty() {
            return Some(Vec::new());
        }

        let matches: Vec<FormMatch> = decompositions
            .into_iter()
            .filter_map(|captures| {
                let mut specificity = self.literal_len;
                if constrained {
                    for (&index, value) in self.variables.iter().zip(&captures) {
                        specificity += self.constraint(index).specificity(value)?;
                    }
                }
                Some(FormMatch {
                    specificity,
                    captures,
                })
            })
            .collect();

        if matches.is_empty() {
            None
        } else {
            Some(matches)
        }
    }

    /// Map captures in template order to a per-variable assignment.
    pub(crate) fn assignment(&self, captures: &[String], num_vars: usize) -> Vec<Option<String>> {
        let mut assignment = vec![None; num_vars];
        for (&index, value) in self.variables.iter().zip(captures) {
            if let Some(slot) = index.checked_sub(1).and_then(|i| assignment.get_mut(i)) {
                *slot = Some(value.clone());
            }
        }
        assignment
    }

    /// The literal strings around the variables, `_` standing in for an
    /// empty literal at the edges or between adjacent variables.
    pub fn strs(&self) -> Vec<String> {
        let mut out = Vec::new();
        let is_var = |i: usize| matches!(self.template.get(i), Some(Token::Var(_)));

        if is_var(0) {
            out.push("_".to_string());
        }
        for (i, token) in self.template.iter().enumerate() {
            match token {
                Token::Literal(s) => out.push(s.clone()),
                Token::Var(_) if is_var(i + 1) => out.push("_".to_string()),
                Token::Var(_) => {}
            }
        }
        if is_var(self.template.len() - 1) {
            out.push("_".to_string());
        }
        out
    }

    /// Every split of `chars` into the template, each variable taking at
    /// least one character. Repeated variables must capture equal text.
    fn decompose(&self, chars: &[char]) -> Vec<Vec<String>> {
        struct Frame {
            token: usize,
            pos: usize,
            spans: Vec<(usize, usize)>,
        }

        let mut results = Vec::new();
        let mut stack = vec![Frame {
            token: 0,
            pos: 0,
            spans: Vec::new(),
        }];

        while let Some(Frame { token, pos, spans }) = stack.pop() {
            if token == self.template.len() {
                if pos == chars.len() {
                    if let Some(captures) = self.captures(chars, &spans) {
                        results.push(captures);
                    }
                }
                continue;
            }
            if chars.len() < pos + self.min_tail[token] {
                continue;
            }

            match &self.template[token] {
                Token::Literal(lit) => {
                    let n = lit.chars().count();
                    let fits = chars[pos..pos + n].iter().copied().eq(lit.chars());
                    if fits {
                        stack.push(Frame {
                            token: token + 1,
                            pos: pos + n,
                            spans,
                        });
                    }
                }
                Token::Var(_) => {
                    let max_end = chars.len() - self.min_tail[token + 1];
                    // Longest pushed first so the shortest is explored first
                    for end in (pos + 1..=max_end).rev() {
                        let mut spans = spans.clone();
                        spans.push((pos, end));
                        stack.push(Frame {
                            token: token + 1,
                            pos: end,
                            spans,
                        });
                    }
                }
            }
        }

        results
    }

    fn captures(&self, chars: &[char], spans: &[(usize, usize)]) -> Option<Vec<String>> {
        let captures: Vec<String> = spans
            .iter()
            .map(|&(start, end)| chars[start..end].iter().collect())
            .collect();

        let mut seen: BTreeMap<usize, &str> = BTreeMap::new();
        for (&index, value) in self.variables.iter().zip(&captures) {
            if let Some(previous) = seen.insert(index, value) {
                if previous != value {
                    return None;
                }
            }
        }
        Some(captures)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.msd.is_empty() {
            write!(f, "{}", format_template(&self.template))
        } else {
            write!(f, "{}::{}", format_template(&self.template), self.msd)
        }
    }
}

// ============================================================================
// Paradigms
// ============================================================================

/// Per-form result of matching a word against a paradigm.
pub type CellMatch = (usize, Option<Vec<FormMatch>>);

/// A generalized inflection pattern.
#[derive(Debug, Clone)]
pub struct Paradigm {
    name: String,
    uuid: String,
    part_of_speech: String,
    lexicon: String,
    forms: Vec<Form>,
    bindings: Vec<Binding>,
    classes: BTreeMap<String, BTreeSet<String>>,
    count: usize,
    members: Vec<String>,
    slots: Vec<Slot>,
    num_vars: usize,
}

impl Paradigm {
    /// Build a paradigm from its forms and the bindings it was learned from.
    ///
    /// Variable constraints are fit from the distinct values each variable
    /// takes across `bindings`.
    pub fn new(forms: Vec<(Template, Msd)>, bindings: Vec<Binding>) -> Result<Self, ParadigmError> {
        if forms.is_empty() {
            return Err(ParadigmError::NoForms);
        }
        if forms.iter().any(|(t, _)| t.is_empty()) {
            return Err(ParadigmError::EmptyTemplate);
        }

        let used: BTreeSet<usize> = forms
            .iter()
            .flat_map(|(t, _)| t.iter())
            .filter_map(|t| match t {
                Token::Var(i) => Some(*i),
                Token::Literal(_) => None,
            })
            .collect();
        let num_vars = used.len();
        if !used.iter().copied().eq(1..=num_vars) {
            return Err(ParadigmError::NonContiguousVariables {
                expected: num_vars,
                found: used.into_iter().collect(),
            });
        }

        for (i, binding) in bindings.iter().enumerate() {
            if binding.values.len() != num_vars {
                return Err(ParadigmError::BindingArity {
                    binding: i,
                    expected: num_vars,
                    found: binding.values.len(),
                });
            }
        }

        let constraints: Vec<Generalizer> = (0..num_vars)
            .map(|v| {
                let distinct: BTreeSet<&str> = bindings.iter().map(|b| b.values[v].as_str()).collect();
                let pool: Vec<&str> = distinct.into_iter().collect();
                Generalizer::fit(&pool, DEFAULT_PVALUE)
            })
            .collect();

        let forms = forms
            .into_iter()
            .map(|(template, msd)| Form::new(template, msd, constraints.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let members = bindings
            .iter()
            .map(|b| match &b.identifier {
                Some(id) => id.clone(),
                None => forms[0].instantiate(&b.values).unwrap_or_default(),
            })
            .collect();
        let slots = compute_slots(&forms, &bindings, num_vars);

        let mut paradigm = Self {
            name: String::new(),
            uuid: Uuid::new_v4().to_string(),
            part_of_speech: String::new(),
            lexicon: String::new(),
            forms,
            count: bindings.len(),
            bindings,
            classes: BTreeMap::new(),
            members,
            slots,
            num_vars,
        };
        paradigm.name = paradigm.default_name();
        Ok(paradigm)
    }

    /// Build from template text, e.g. `[("1+a+2", msd), ...]`.
    pub fn from_templates<S: AsRef<str>>(
        forms: &[(S, Msd)],
        bindings: Vec<Binding>,
    ) -> Result<Self, ParadigmError> {
        let forms = forms
            .iter()
            .map(|(t, m)| Ok((parse_template(t.as_ref())?, m.clone())))
            .collect::<Result<Vec<_>, ParadigmError>>()?;
        Self::new(forms, bindings)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = pos.into();
        self
    }

    pub fn with_lexicon(mut self, lexicon: impl Into<String>) -> Self {
        self.lexicon = lexicon.into();
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn part_of_speech(&self) -> &str {
        &self.part_of_speech
    }

    pub fn lexicon(&self) -> &str {
        &self.lexicon
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of training tables the paradigm was learned from.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn classes(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.classes
    }

    /// Attach a named class of member words.
    pub fn add_class<S: Into<String>>(&mut self, name: impl Into<String>, members: impl IntoIterator<Item = S>) {
        self.classes
            .entry(name.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
    }

    /// Drop bindings and members. Count, forms and constraints are kept.
    pub fn shrink(&mut self) {
        self.bindings = Vec::new();
        self.members = Vec::new();
    }

    /// The forms joined by `#`.
    pub fn pattern(&self) -> String {
        self.forms
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("#")
    }

    /// Generate the full table for one variable assignment.
    pub fn instantiate<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<(String, Msd)>, ParadigmError> {
        if values.len() != self.num_vars {
            return Err(ParadigmError::ValueCount {
                expected: self.num_vars,
                found: values.len(),
            });
        }
        self.forms
            .iter()
            .map(|f| Ok((f.instantiate(values)?, f.msd().clone())))
            .collect()
    }

    /// Whether `word` fits some form (only the first with `baseform`).
    pub fn fits(&self, word: &str, tag: Option<&Msd>, constrained: bool, baseform: bool) -> bool {
        let forms = if baseform { &self.forms[..1] } else { &self.forms[..] };
        forms.iter().any(|f| f.matches(word, tag, constrained))
    }

    /// Match `word` against the selected forms.
    ///
    /// Forms are chosen by `selection` if given, else only the first form
    /// with `baseform`, else all forms; `tag` keeps only forms with that
    /// MSD. Returns `(form index, result)` pairs. With two or more
    /// variables the matches of each form are ordered by the length of the
    /// second capture.
    pub fn match_word(
        &self,
        word: &str,
        selection: Option<&[usize]>,
        constrained: bool,
        tag: Option<&Msd>,
        baseform: bool,
    ) -> Vec<CellMatch> {
        let indices: Vec<usize> = match selection {
            Some(sel) => sel.iter().copied().filter(|&i| i < self.forms.len()).collect(),
            None if baseform => vec![0],
            None => (0..self.forms.len()).collect(),
        };

        indices
            .into_iter()
            .filter(|&i| tag.map_or(true, |t| t == self.forms[i].msd()))
            .map(|i| {
                let mut result = self.forms[i].match_vars(word, constrained);
                if self.num_vars >= 2 {
                    if let Some(matches) = result.as_mut() {
                        matches.sort_by_key(|m| m.captures.get(1).map_or(0, |s| s.chars().count()));
                    }
                }
                (i, result)
            })
            .collect()
    }

    fn default_name(&self) -> String {
        let first = match self.bindings.first() {
            Some(b) => self.forms[0].instantiate(&b.values).ok(),
            None if self.num_vars == 0 => self.forms[0].instantiate::<&str>(&[]).ok(),
            None => None,
        };
        format!(
            "p_{}",
            first.unwrap_or_else(|| format_template(self.forms[0].template()))
        )
    }
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern())?;
        if !self.bindings.is_empty() {
            let bindings: Vec<String> = self.bindings.iter().map(|b| b.to_string()).collect();
            write!(f, "\t{}", bindings.join("#"))?;
        }
        Ok(())
    }
}

/// Interleave fixed and variable slots: fixed, var 1, fixed, var 2, ...
fn compute_slots(forms: &[Form], bindings: &[Binding], num_vars: usize) -> Vec<Slot> {
    let strs: Vec<Vec<String>> = forms.iter().map(Form::strs).collect();
    let width = strs.iter().map(Vec::len).min().unwrap_or(0);

    let mut slots = Vec::with_capacity(width + num_vars);
    for k in 0..width.max(num_vars) {
        if k < width {
            slots.push(Slot::Fixed(strs.iter().map(|s| s[k].clone()).collect()));
        }
        if k < num_vars {
            slots.push(Slot::Variable(
                bindings.iter().map(|b| b.values[k].clone()).collect(),
            ));
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msd(v: &str) -> Msd {
        Msd::single("msd", v)
    }

    fn stad_paradigm() -> Paradigm {
        Paradigm::from_templates(
            &[
                ("1+a+2", msd("sg indef nom")),
                ("1+ä+2+er", msd("pl indef nom")),
                ("1+a+2+s", msd("sg indef gen")),
            ],
            vec![
                Binding::with_identifier("stad", vec!["st".into(), "d".into()]),
                Binding::with_identifier("bad", vec!["b".into(), "d".into()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_template() {
        let t = parse_template("1+ä+2+er").unwrap();
        assert_eq!(
            t,
            vec![
                Token::Var(1),
                Token::Literal("ä".into()),
                Token::Var(2),
                Token::Literal("er".into())
            ]
        );
        assert_eq!(format_template(&t), "1+ä+2+er");
        assert_eq!(parse_template(""), Err(ParadigmError::EmptyTemplate));
        assert!(matches!(parse_template("0+a"), Err(ParadigmError::InvalidTemplate(_))));
    }

    #[test]
    fn test_template_escaping() {
        let numeric = vec![Token::Literal("12".into())];
        assert_eq!(format_template(&numeric), "\\12");
        assert_eq!(parse_template(&format_template(&numeric)).unwrap(), numeric);

        let awkward = vec![
            Token::Var(1),
            Token::Literal("a+b#c::d\\".into()),
            Token::Var(2),
        ];
        let text = format_template(&awkward);
        assert_eq!(parse_template(&text).unwrap(), awkward);

        let stored = format!("{}::num=pl", text);
        assert_eq!(split_form(&stored), (text.as_str(), "num=pl"));
        assert_eq!(split_unescaped(&format!("{}#1", text), '#'), vec![text.as_str(), "1"]);
        assert_eq!(split_form("1+s"), ("1+s", ""));
    }

    #[test]
    fn test_binding_parse_and_display() {
        let b = Binding::parse("first-attest=stad,,1=st,,2=d").unwrap();
        assert_eq!(b.identifier.as_deref(), Some("stad"));
        assert_eq!(b.values, vec!["st", "d"]);
        assert_eq!(b.to_string(), "first-attest=stad,,1=st,,2=d");

        let b = Binding::parse("2=d,,0=stad,,1=st").unwrap();
        assert_eq!(b.values, vec!["st", "d"]);
        assert!(Binding::parse("1=a,,3=b").is_err());
        assert!(Binding::parse("x").is_err());
    }

    #[test]
    fn test_instantiate() {
        let p = stad_paradigm();
        let table = p.instantiate(&["st", "d"]).unwrap();
        let words: Vec<&str> = table.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["stad", "städer", "stads"]);
        assert_eq!(table[1].1, msd("pl indef nom"));
        assert!(p.instantiate(&["st"]).is_err());
    }

    #[test]
    fn test_derived_fields() {
        let p = stad_paradigm();
        assert_eq!(p.name(), "p_stad");
        assert_eq!(p.count(), 2);
        assert_eq!(p.members(), &["stad".to_string(), "bad".to_string()]);
        assert_eq!(p.num_vars(), 2);
        assert_eq!(p.uuid().len(), 36);
        assert_eq!(
            p.slots(),
            &[
                Slot::Fixed(vec!["_".into(), "_".into(), "_".into()]),
                Slot::Variable(vec!["st".into(), "b".into()]),
                Slot::Fixed(vec!["a".into(), "ä".into(), "a".into()]),
                Slot::Variable(vec!["d".into(), "d".into()]),
                Slot::Fixed(vec!["_".into(), "er".into(), "s".into()]),
            ]
        );
    }

    #[test]
    fn test_validation() {
        let err = Paradigm::from_templates(&[("1+a+3", Msd::default())], vec![]).unwrap_err();
        assert_eq!(
            err,
            ParadigmError::NonContiguousVariables {
                expected: 2,
                found: vec![1, 3]
            }
        );
        let err = Paradigm::from_templates(
            &[("1+a", Msd::default())],
            vec![Binding::new(vec!["x".into(), "y".into()])],
        )
        .unwrap_err();
        assert!(matches!(err, ParadigmError::BindingArity { .. }));
        assert_eq!(
            Paradigm::new(vec![], vec![]).unwrap_err(),
            ParadigmError::NoForms
        );
    }

    #[test]
    fn test_match_single_form() {
        let p = stad_paradigm();
        let result = p.match_word("vad", Some(&[0]), true, None, false);
        assert_eq!(result.len(), 1);
        let matches = result[0].1.as_ref().unwrap();
        assert_eq!(
            matches,
            &vec![FormMatch {
                specificity: 1,
                captures: vec!["v".into(), "d".into()]
            }]
        );
        assert!(p.match_word("apa", Some(&[0]), true, None, false)[0].1.is_none());
    }

    #[test]
    fn test_match_vars_enumerates_decompositions() {
        let form = Form::new(parse_template("1+a+2+as").unwrap(), Msd::default(), vec![]).unwrap();
        let matches = form.match_vars("bananas", false).unwrap();
        let captures: Vec<Vec<String>> = matches.into_iter().map(|m| m.captures).collect();
        assert_eq!(
            captures,
            vec![
                vec!["b".to_string(), "nan".to_string()],
                vec!["ban".to_string(), "n".to_string()]
            ]
        );
    }

    #[test]
    fn test_match_without_variables() {
        let form = Form::new(parse_template("apa").unwrap(), Msd::default(), vec![]).unwrap();
        assert_eq!(form.match_vars("apa", true), Some(vec![]));
        assert_eq!(form.match_vars("apan", true), None);
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let form = Form::new(parse_template("1+-+1").unwrap(), Msd::default(), vec![]).unwrap();
        assert!(form.match_vars("bye-bye", false).is_some());
        assert!(form.match_vars("bye-bya", false).is_none());
    }

    #[test]
    fn test_constraints_drop_captures() {
        let constraint = Generalizer::Exact(["d".to_string()].into_iter().collect());
        let form = Form::new(
            parse_template("1+a+2").unwrap(),
            Msd::default(),
            vec![Generalizer::Any, constraint],
        )
        .unwrap();
        let matches = form.match_vars("stad", true).unwrap();
        assert_eq!(matches[0].specificity, 2);
        assert!(form.match_vars("stat", true).is_none());
        assert!(form.match_vars("stat", false).is_some());
    }

    #[test]
    fn test_strs() {
        let form = Form::new(parse_template("1+2+ab+3").unwrap(), Msd::default(), vec![]).unwrap();
        assert_eq!(form.strs(), vec!["_", "_", "ab", "_"]);
    }

    #[test]
    fn test_fits_and_tag_filter() {
        let p = stad_paradigm();
        assert!(p.fits("städer", None, false, false));
        assert!(!p.fits("städer", None, false, true));
        assert!(p.fits("städer", Some(&msd("pl indef nom")), false, false));
        assert!(!p.fits("städer", Some(&msd("sg indef nom")), false, false));
    }

    #[test]
    fn test_shrink_and_classes() {
        let mut p = stad_paradigm();
        p.add_class("gender", ["stad", "bad"]);
        p.shrink();
        assert!(p.bindings().is_empty());
        assert!(p.members().is_empty());
        assert_eq!(p.count(), 2);
        assert_eq!(p.classes()["gender"].len(), 2);
    }

    #[test]
    fn test_display() {
        let p = stad_paradigm();
        assert_eq!(
            p.to_string(),
            "1+a+2::msd=sg indef nom#1+ä+2+er::msd=pl indef nom#1+a+2+s::msd=sg indef gen\t\
             first-attest=stad,,1=st,,2=d#first-attest=bad,,1=b,,2=d"
        );
    }

    #[test]
    fn test_name_without_bindings() {
        let p = Paradigm::from_templates(&[("apa", Msd::default())], vec![]).unwrap();
        assert_eq!(p.name(), "p_apa");
        assert_eq!(p.num_vars(), 0);
        let p = Paradigm::from_templates(&[("1+a", Msd::default())], vec![]).unwrap();
        assert_eq!(p.name(), "p_1+a");
    }
}
