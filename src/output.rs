//! Output formatting for paradigm sets and analyses (paradigm file, JSON, text reports).

use crate::analyze::Analysis;
use crate::generate::Inflection;
use crate::models::{Msd, ParadigmFormat, ParadigmRecord, ProcessRecord, TransformRecord};
use crate::paradigm::{format_template, Paradigm, Token};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Paradigm sets
// ============================================================================

/// Write paradigms one per line in the paradigm file format.
pub fn write_paradigms<W: Write>(paradigms: &[Paradigm], writer: &mut W) -> Result<(), OutputError> {
    for p in paradigms {
        writeln!(writer, "{}", p)?;
    }
    Ok(())
}

/// Write paradigms in the paradigm file format to a file.
pub fn write_paradigms_file(paradigms: &[Paradigm], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_paradigms(paradigms, &mut file)
}

fn features(msd: &Msd) -> BTreeMap<String, String> {
    msd.tags()
        .iter()
        .map(|t| {
            let key = t.attribute.clone().unwrap_or_else(|| "msd".to_string());
            (key, t.value.clone())
        })
        .collect()
}

/// Convert a paradigm to its JSON record.
pub fn paradigm_to_record(p: &Paradigm) -> ParadigmRecord {
    let variable_instances = p
        .bindings()
        .iter()
        .map(|b| {
            let mut slots = BTreeMap::new();
            if let Some(id) = &b.identifier {
                slots.insert("first-attest".to_string(), id.clone());
            }
            for (i, v) in b.values.iter().enumerate() {
                slots.insert((i + 1).to_string(), v.clone());
            }
            slots
        })
        .collect();

    let transforms = p
        .forms()
        .iter()
        .map(|f| TransformRecord {
            process: f
                .template()
                .iter()
                .map(|t| match t {
                    Token::Var(i) => ProcessRecord::AddVariable {
                        variable_num: i.to_string(),
                        operator: "addAfter".to_string(),
                    },
                    Token::Literal(s) => ProcessRecord::AddConstant {
                        string_value: s.clone(),
                        operator: "addAfter".to_string(),
                    },
                })
                .collect(),
            features: features(f.msd()),
        })
        .collect();

    ParadigmRecord {
        id: p.name().to_string(),
        uuid: p.uuid().to_string(),
        part_of_speech: p.part_of_speech().to_string(),
        lexicon: p.lexicon().to_string(),
        entries: p.members().len(),
        variable_instances,
        classes: p
            .classes()
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect(),
        transforms,
    }
}

/// Write paradigms as a JSON array of records.
pub fn write_json<W: Write>(paradigms: &[Paradigm], writer: &mut W) -> Result<(), OutputError> {
    let records: Vec<ParadigmRecord> = paradigms.iter().map(paradigm_to_record).collect();
    let json = serde_json::to_string_pretty(&records)?;
    writer.write_all(json.as_bytes())?;
    writeln!(writer)?;
    Ok(())
}

/// Write paradigms as JSON to a file.
pub fn write_json_file(paradigms: &[Paradigm], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_json(paradigms, &mut file)
}

/// Write paradigms to `writer` in the given format.
pub fn write_paradigms_as<W: Write>(
    paradigms: &[Paradigm],
    writer: &mut W,
    format: ParadigmFormat,
) -> Result<(), OutputError> {
    match format {
        ParadigmFormat::PFile => write_paradigms(paradigms, writer),
        ParadigmFormat::Json => write_json(paradigms, writer),
    }
}

/// Write a summary of a learning run to stderr.
pub fn print_summary(num_tables: usize, paradigms: &[Paradigm]) {
    let with_vars = paradigms.iter().filter(|p| p.num_vars() > 0).count();
    let largest = paradigms.iter().max_by_key(|p| p.count());

    eprintln!("\n=== Learning Summary ===");
    eprintln!("Tables: {}", num_tables);
    eprintln!("Paradigms: {}", paradigms.len());
    eprintln!("  With variables: {}", with_vars);
    eprintln!("  Literal only: {}", paradigms.len() - with_vars);
    if let Some(p) = largest {
        eprintln!("  Largest: {} ({} tables)", p.name(), p.count());
    }
}

/// Print a paradigm's name, size, members and forms.
pub fn print_paradigm_info(p: &Paradigm) {
    println!("name: {}, count: {}", p.name(), p.count());
    println!("members: {}", p.members().join(", "));
    for form in p.forms() {
        println!("{}\t{}", format_template(form.template()), form.msd());
    }
    println!();
}

// ============================================================================
// Analyses
// ============================================================================

/// A scored analysis in the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub score: f64,
    pub paradigm: String,
    pub variables: Vec<String>,
    pub table: Vec<(String, String)>,
}

impl AnalysisRecord {
    pub fn from_analysis(a: &Analysis<'_>) -> Self {
        Self {
            score: a.score,
            paradigm: a.paradigm.name().to_string(),
            variables: a.variables.clone(),
            table: a
                .paradigm
                .instantiate(&a.variables)
                .unwrap_or_default()
                .into_iter()
                .map(|(form, msd)| (form, msd.to_string()))
                .collect(),
        }
    }
}

/// Format an analysis as `SCORE NAME (1=v,2=v) form:baseform,msd#...`,
/// listing only the cells whose form is one of the query words.
pub fn format_analysis(a: &Analysis<'_>, words: &[String]) -> String {
    let variables = a
        .variables
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}={}", i + 1, v))
        .collect::<Vec<_>>()
        .join(",");

    let table = a.paradigm.instantiate(&a.variables).unwrap_or_default();
    let baseform = table.first().map(|(f, _)| f.clone()).unwrap_or_default();
    let cells = table
        .iter()
        .filter(|(form, _)| words.contains(form))
        .map(|(form, msd)| {
            if msd.is_empty() {
                format!("{}:{}", form, baseform)
            } else {
                format!("{}:{},{}", form, baseform, msd.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join("#");

    format!("{:.3} {} ({}) {}", a.score, a.paradigm.name(), variables, cells)
}

/// Format the full table of an analysis as `form<TAB>msd` lines, with
/// the query words shown as `*form*`.
pub fn format_table(a: &Analysis<'_>, words: &[String]) -> String {
    a.paradigm
        .instantiate(&a.variables)
        .unwrap_or_default()
        .iter()
        .map(|(form, msd)| {
            if words.contains(form) {
                format!("*{}*\t{}", form, msd.join(","))
            } else {
                format!("{}\t{}", form, msd.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The citation forms a paradigm was learned from, as `Members: a, b`.
pub fn format_members(p: &Paradigm) -> String {
    format!("Members: {}", p.members().join(", "))
}

/// What to print for each query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub kbest: usize,
    /// Print the full table of every reported analysis
    pub tables: bool,
    /// List the plausible paradigms and the members of each reported one
    pub debug: bool,
}

/// Print the best analyses of one query to stdout.
pub fn print_analyses(analyses: &[Analysis<'_>], words: &[String], options: ReportOptions) {
    if options.debug {
        println!("Plausible paradigms:");
        let mut seen = Vec::new();
        for a in analyses {
            if !seen.contains(&a.paradigm.name()) {
                seen.push(a.paradigm.name());
                println!("{}", a.paradigm.name());
            }
        }
    }
    if analyses.is_empty() {
        println!("{}\t(no analysis)", words.join(" "));
        return;
    }
    for a in analyses.iter().take(options.kbest) {
        println!("{}", format_analysis(a, words));
        if options.tables {
            println!("{}", format_table(a, words));
        }
        if options.debug {
            println!("{}", format_members(a.paradigm));
        }
    }
    println!();
}

/// Print the tables generated for a known member, one block per paradigm.
pub fn print_inflections(member: &str, inflections: &[Inflection<'_>]) {
    if inflections.is_empty() {
        println!("{}\t(unknown member)", member);
        println!();
        return;
    }
    for inflection in inflections {
        println!("# {} {}", member, inflection.paradigm.name());
        for (form, msd) in &inflection.table {
            println!("{}\t{}", form, msd.join(","));
        }
        println!();
    }
}

/// Write the `kbest` analyses of one query as a JSON line.
pub fn write_analyses_json<W: Write>(
    analyses: &[Analysis<'_>],
    words: &[String],
    kbest: usize,
    writer: &mut W,
) -> Result<(), OutputError> {
    #[derive(Serialize)]
    struct QueryReport<'w> {
        words: &'w [String],
        analyses: Vec<AnalysisRecord>,
    }

    let report = QueryReport {
        words,
        analyses: analyses.iter().take(kbest).map(AnalysisRecord::from_analysis).collect(),
    };
    serde_json::to_writer(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
