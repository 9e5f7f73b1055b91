//! Morphological Paradigm Extraction Library
//!
//! Learns generalized inflection paradigms from tables of related word
//! forms and analyzes unseen words against them. A paradigm is a list of
//! templates mixing fixed text with numbered stem variables; the variables
//! are found by anchoring every form of a table on the longest common
//! subsequence of the table.
//!
//! # Example
//!
//! ```no_run
//! use paradigm_extract::prelude::*;
//! use std::path::Path;
//!
//! // Learn paradigms from a training file
//! let tables = load_training_tables(Path::new("nouns.txt")).unwrap();
//! let paradigms = learn_paradigms(&tables, &LearnParams::default(), false).unwrap();
//!
//! // Analyze an unseen word
//! let params = ParserParams::default();
//! let model = ParserModel::from_params(paradigms, &params).unwrap();
//! let query = Query::words(["städer"]);
//! for analysis in model.analyze(&query, &params) {
//!     println!("{}", format_analysis(&analysis, query.word_list()));
//! }
//! ```

pub mod analyze;
pub mod bracket;
pub mod extract;
pub mod filter;
pub mod generalize;
pub mod generate;
pub mod load;
pub mod merge;
pub mod models;
pub mod ngram;
pub mod output;
pub mod paradigm;
pub mod wordgraph;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analyze::{
        eval_baseform, eval_multiple_entries, log_prior, paradigm_alphabet, test_member_paradigms,
        test_paradigm, test_paradigms, Analysis, ParserError, ParserModel, SlotModels,
    };
    pub use crate::bracket::{eval_factors, find_factors, to_template, Bracketing, Part};
    pub use crate::extract::{best_candidate, learn_paradigms, TableCandidate};
    pub use crate::filter::{count_combinations, filter_bracketings, DEFAULT_FILTERS};
    pub use crate::generalize::{Generalizer, DEFAULT_PVALUE};
    pub use crate::generate::{inflect_any, inflect_member, Inflection};
    pub use crate::load::{
        load_json_paradigms, load_paradigm_file, load_paradigms, load_training_tables,
        paradigm_from_record, parse_member_query, parse_query, parse_training_tags,
        read_json_paradigms, read_paradigm_file,
        read_training_tables, LoadError,
    };
    pub use crate::merge::merge_tables;
    pub use crate::models::{
        InflectionTable, LearnParams, ModelError, Msd, ParadigmFormat, ParadigmRecord,
        ParserParams, Query, Tag,
    };
    pub use crate::ngram::StringNgram;
    pub use crate::output::{
        format_analysis, format_members, format_table, paradigm_to_record, print_analyses,
        print_inflections, print_paradigm_info, print_summary, write_analyses_json, write_json,
        write_json_file, write_paradigms, write_paradigms_as, write_paradigms_file, AnalysisRecord,
        OutputError, ReportOptions,
    };
    pub use crate::paradigm::{
        format_template, parse_template, Binding, Form, FormMatch, Paradigm, ParadigmError, Slot,
        Template, Token,
    };
    pub use crate::wordgraph::{longest_common_subsequences, WordGraph};
}

// Re-export commonly used types at the crate root
pub use models::{InflectionTable, LearnParams, Msd, ParserParams, Query, Tag};
pub use paradigm::Paradigm;
