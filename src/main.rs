//! Paradigm extraction pipeline
//!
//! Learns generalized inflection paradigms from tables of word forms and
//! analyzes unseen words against them.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

mod analyze;
mod bracket;
mod extract;
mod filter;
mod generalize;
mod generate;
mod load;
mod merge;
mod models;
mod ngram;
mod output;
mod paradigm;
mod wordgraph;

use analyze::ParserModel;
use extract::learn_paradigms;
use generate::inflect_any;
use load::{load_paradigms, load_training_tables, parse_member_query, parse_query, read_training_tables};
use models::{LearnParams, ParadigmFormat, ParserParams};
use output::{
    print_analyses, print_inflections, print_paradigm_info, print_summary, write_analyses_json,
    write_paradigms_as, ReportOptions,
};

#[derive(Parser)]
#[command(name = "paradigm-extract")]
#[command(about = "Learn inflection paradigms from word-form tables and analyze unseen words")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Storage format for paradigm sets (CLI version, mirrors models::ParadigmFormat)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    /// One paradigm per line
    Pfile,
    /// JSON array of paradigm records
    Json,
}

impl From<CliFormat> for ParadigmFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Pfile => ParadigmFormat::PFile,
            CliFormat::Json => ParadigmFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Learn paradigms from inflection tables
    Learn {
        /// Training tables (stdin if omitted)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "pfile")]
        format: CliFormat,

        /// Combination count above which bracketing filters engage [default: 16]
        #[arg(long)]
        table_limit: Option<usize>,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,
    },

    /// Analyze words against a paradigm set, one query per line
    Analyze {
        /// Paradigm file
        #[arg(long)]
        paradigms: PathBuf,

        /// Format of the paradigm file
        #[arg(long, value_enum, default_value = "pfile")]
        paradigm_format: CliFormat,

        /// Queries, one per line: whitespace-separated words or
        /// word<TAB>msd pairs (stdin if omitted)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Number of analyses to print per query [default: 1]
        #[arg(short, long)]
        k: Option<usize>,

        /// Print the full table of each analysis
        #[arg(long)]
        tables: bool,

        /// N-gram order of the slot models [default: 3]
        #[arg(long)]
        ngram: Option<usize>,

        /// Additive smoothing of the slot models [default: 0.01]
        #[arg(long)]
        ngram_prior: Option<f64>,

        /// Weight of the paradigm frequency prior [default: 1.0]
        #[arg(long)]
        prior_weight: Option<f64>,

        /// The first word of each query is the citation form
        #[arg(long)]
        baseform: bool,

        /// Only report analyses whose table is exactly the tagged query
        #[arg(long)]
        match_all: bool,

        /// The last field of each line names the member whose paradigms are tried
        #[arg(long)]
        choose: bool,

        /// Drop bindings and members after training the slot models
        #[arg(long)]
        small: bool,

        /// List plausible paradigms and the members of each reported one
        #[arg(short, long)]
        debug: bool,

        /// Write one JSON report per query
        #[arg(long)]
        json: bool,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,
    },

    /// Print the stored tables of known members, one member per line
    Inflect {
        /// Paradigm file
        #[arg(long)]
        paradigms: PathBuf,

        /// Format of the paradigm file
        #[arg(long, value_enum, default_value = "pfile")]
        paradigm_format: CliFormat,

        /// Members, `|` separating alternatives (stdin if omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Show the paradigms of a paradigm file
    Info {
        /// Paradigm file
        #[arg(long)]
        paradigms: PathBuf,

        /// Format of the paradigm file
        #[arg(long, value_enum, default_value = "pfile")]
        paradigm_format: CliFormat,
    },
}

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    match path {
        Some(p) => Ok(Box::new(BufReader::new(File::open(p)?))),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Learn {
            input,
            output,
            format,
            table_limit,
            quiet,
        } => {
            let defaults = LearnParams::default();
            let params = LearnParams {
                table_limit: table_limit.unwrap_or(defaults.table_limit),
            };

            let tables = match &input {
                Some(path) => load_training_tables(path)?,
                None => read_training_tables(io::stdin().lock())?,
            };
            if !quiet {
                eprintln!("Loaded {} tables", tables.len());
            }

            let paradigms = learn_paradigms(&tables, &params, !quiet)?;

            match &output {
                Some(path) => {
                    let mut writer = BufWriter::new(File::create(path)?);
                    write_paradigms_as(&paradigms, &mut writer, format.into())?;
                    writer.flush()?;
                }
                None => {
                    let mut writer = io::stdout().lock();
                    write_paradigms_as(&paradigms, &mut writer, format.into())?;
                }
            }

            if !quiet {
                print_summary(tables.len(), &paradigms);
                if let Some(path) = &output {
                    eprintln!("\nOutput: {}", path.display());
                }
            }
        }

        Commands::Analyze {
            paradigms,
            paradigm_format,
            input,
            k,
            tables,
            ngram,
            ngram_prior,
            prior_weight,
            baseform,
            match_all,
            choose,
            small,
            debug,
            json,
            quiet,
        } => {
            let defaults = ParserParams::default();
            let params = ParserParams {
                ngram_order: ngram.unwrap_or(defaults.ngram_order),
                ngram_prior: ngram_prior.unwrap_or(defaults.ngram_prior),
                prior_weight: prior_weight.unwrap_or(defaults.prior_weight),
                kbest: k.unwrap_or(defaults.kbest),
                match_all,
                baseform,
                small,
            };
            let report = ReportOptions {
                kbest: params.kbest,
                tables,
                debug,
            };

            let corpus = load_paradigms(&paradigms, paradigm_format.into())?;
            if !quiet {
                eprintln!("Loaded {} paradigms", corpus.len());
                eprintln!("Training slot models (order {})...", params.ngram_order);
            }
            let model = ParserModel::from_params(corpus, &params)?;

            let reader = open_input(input.as_deref())?;
            let mut stdout = io::stdout().lock();
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                let (query, analyses) = if choose {
                    let Some((query, members)) = parse_member_query(&line, i + 1)? else {
                        continue;
                    };
                    let analyses = model.analyze_member(&query, &members, &params);
                    (query, analyses)
                } else {
                    let Some(query) = parse_query(&line, i + 1)? else {
                        continue;
                    };
                    let analyses = model.analyze(&query, &params);
                    (query, analyses)
                };
                if json {
                    write_analyses_json(&analyses, query.word_list(), params.kbest, &mut stdout)?;
                } else {
                    print_analyses(&analyses, query.word_list(), report);
                }
            }
        }

        Commands::Inflect {
            paradigms,
            paradigm_format,
            input,
        } => {
            let corpus = load_paradigms(&paradigms, paradigm_format.into())?;
            let reader = open_input(input.as_deref())?;
            for line in reader.lines() {
                let line = line?;
                let member = line.trim();
                if member.is_empty() {
                    continue;
                }
                let names: Vec<String> = member.split('|').map(str::to_string).collect();
                let inflections = inflect_any(&corpus, &names)?;
                print_inflections(member, &inflections);
            }
        }

        Commands::Info {
            paradigms,
            paradigm_format,
        } => {
            let corpus = load_paradigms(&paradigms, paradigm_format.into())?;
            println!("=== {} paradigms ===", corpus.len());
            for p in &corpus {
                print_paradigm_info(p);
            }
        }
    }

    Ok(())
}
