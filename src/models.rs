//! Data structures for the paradigm learning and analysis pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("inflection table has no forms")]
    EmptyTable,
    #[error("inflection table has {forms} forms but {tags} tag lists")]
    TableLengthMismatch { forms: usize, tags: usize },
    #[error("query has {words} words but {tags} tags")]
    QueryLengthMismatch { words: usize, tags: usize },
    #[error("unparsable tag: {0:?}")]
    InvalidTag(String),
}

/// A single morphosyntactic feature, e.g. `num=sg`, or a bare value such as `SGNOM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub attribute: Option<String>,
    pub value: String,
}

impl Tag {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            value: value.into(),
        }
    }

    /// A tag without an attribute name.
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            attribute: None,
            value: value.into(),
        }
    }

    /// Parse `attribute=value` or a bare value.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            return Err(ModelError::InvalidTag(s.to_string()));
        }
        let mut parts = s.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(value), None, None) => Ok(Tag::bare(value)),
            (Some(attribute), Some(value), None) if !attribute.is_empty() => {
                Ok(Tag::new(attribute, value))
            }
            _ => Err(ModelError::InvalidTag(s.to_string())),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{}={}", attribute, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Morphosyntactic description identifying one cell of a paradigm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Msd(pub Vec<Tag>);

impl Msd {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self(tags)
    }

    /// An MSD made of one attribute/value pair, e.g. `("msd", "sg indef nom")`.
    pub fn single(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self(vec![Tag::new(attribute, value)])
    }

    /// An MSD made of one free-text value, e.g. `"inf s-form"`.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self(vec![Tag::bare(value)])
    }

    /// Parse the `,,`-separated stored form. The empty string is the empty MSD.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.split(",,").map(Tag::parse).collect::<Result<Vec<_>, _>>().map(Self)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render with a custom separator (reports use `,`).
    pub fn join(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for Msd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join(",,"))
    }
}

/// A training example: related word forms with one MSD per form.
///
/// The first form is the citation form and identifies the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct InflectionTable {
    forms: Vec<String>,
    tags: Vec<Msd>,
}

#[derive(Deserialize)]
struct RawTable {
    forms: Vec<String>,
    tags: Vec<Msd>,
}

impl TryFrom<RawTable> for InflectionTable {
    type Error = ModelError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::new(raw.forms, raw.tags)
    }
}

impl InflectionTable {
    pub fn new(forms: Vec<String>, tags: Vec<Msd>) -> Result<Self, ModelError> {
        if forms.is_empty() {
            return Err(ModelError::EmptyTable);
        }
        if forms.len() != tags.len() {
            return Err(ModelError::TableLengthMismatch {
                forms: forms.len(),
                tags: tags.len(),
            });
        }
        Ok(Self { forms, tags })
    }

    /// Convenience constructor from string slices.
    pub fn from_strs(forms: &[&str], tags: &[Msd]) -> Result<Self, ModelError> {
        Self::new(
            forms.iter().map(|f| f.to_string()).collect(),
            tags.to_vec(),
        )
    }

    pub fn forms(&self) -> &[String] {
        &self.forms
    }

    pub fn tags(&self) -> &[Msd] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// The citation form of the table.
    pub fn baseform(&self) -> &str {
        &self.forms[0]
    }
}

/// Words to analyze, with or without their expected cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    WordsOnly(Vec<String>),
    WordsWithTags(Vec<String>, Vec<Msd>),
}

impl Query {
    pub fn words<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Query::WordsOnly(words.into_iter().map(Into::into).collect())
    }

    pub fn tagged(words: Vec<String>, tags: Vec<Msd>) -> Result<Self, ModelError> {
        if words.len() != tags.len() {
            return Err(ModelError::QueryLengthMismatch {
                words: words.len(),
                tags: tags.len(),
            });
        }
        Ok(Query::WordsWithTags(words, tags))
    }

    pub fn word_list(&self) -> &[String] {
        match self {
            Query::WordsOnly(words) | Query::WordsWithTags(words, _) => words,
        }
    }

    /// Expected tags, empty for untagged queries.
    pub fn tags(&self) -> &[Msd] {
        match self {
            Query::WordsOnly(_) => &[],
            Query::WordsWithTags(_, tags) => tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.word_list().is_empty()
    }
}

/// Storage format of a paradigm set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParadigmFormat {
    /// One paradigm per line, `form::msd#...<TAB>binding#...`
    #[default]
    PFile,
    /// JSON array of paradigm records
    Json,
}

/// Paradigm induction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnParams {
    /// Bracketing filters are engaged while a table has more candidate
    /// combinations than this.
    pub table_limit: usize,
}

impl Default for LearnParams {
    fn default() -> Self {
        Self { table_limit: 16 }
    }
}

/// Analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserParams {
    pub ngram_order: usize,
    pub ngram_prior: f64,  // Additive smoothing for slot models
    pub prior_weight: f64, // Weight of the paradigm frequency prior
    pub kbest: usize,
    pub match_all: bool,   // Require the query to be the full table
    pub baseform: bool,    // First untagged word must be the citation form
    pub small: bool,       // Drop bindings and members once slot models are trained
}

impl Default for ParserParams {
    fn default() -> Self {
        Self {
            ngram_order: 3,
            ngram_prior: 0.01,
            prior_weight: 1.0,
            kbest: 1,
            match_all: false,
            baseform: false,
            small: false,
        }
    }
}

// ============================================================================
// JSON paradigm records
// ============================================================================

/// A stored paradigm in the JSON exchange format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParadigmRecord {
    #[serde(rename = "MorphologicalPatternID", default)]
    pub id: String,
    #[serde(rename = "_uuid", default)]
    pub uuid: String,
    #[serde(rename = "_partOfSpeech", default)]
    pub part_of_speech: String,
    #[serde(rename = "_lexiconName", default)]
    pub lexicon: String,
    #[serde(rename = "_entries", default)]
    pub entries: usize,
    #[serde(rename = "VariableInstances", default)]
    pub variable_instances: Vec<BTreeMap<String, String>>,
    #[serde(rename = "TransformCategory", default)]
    pub classes: BTreeMap<String, Vec<String>>,
    #[serde(rename = "TransformSet", default)]
    pub transforms: Vec<TransformRecord>,
}

/// One form of a stored paradigm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    #[serde(rename = "Process", default)]
    pub process: Vec<ProcessRecord>,
    #[serde(rename = "GrammaticalFeatures", default)]
    pub features: BTreeMap<String, String>,
}

/// One template token of a stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "processType")]
pub enum ProcessRecord {
    #[serde(rename = "pextractAddVariable")]
    AddVariable {
        #[serde(rename = "variableNum")]
        variable_num: String,
        #[serde(default = "default_operator")]
        operator: String,
    },
    #[serde(rename = "pextractAddConstant")]
    AddConstant {
        #[serde(rename = "stringValue")]
        string_value: String,
        #[serde(default = "default_operator")]
        operator: String,
    },
}

fn default_operator() -> String {
    "addAfter".to_string()
}
