//! Readers for training tables and stored paradigm sets.

use crate::models::{
    InflectionTable, ModelError, Msd, ParadigmFormat, ParadigmRecord, ProcessRecord, Query, Tag,
};
use crate::paradigm::{
    parse_template, split_form, split_unescaped, Binding, Paradigm, ParadigmError, Template, Token,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {source}")]
    Table {
        line: usize,
        #[source]
        source: ModelError,
    },
    #[error("record {record}: {source}")]
    Paradigm {
        record: usize,
        #[source]
        source: ParadigmError,
    },
}

// ============================================================================
// Training tables
// ============================================================================

/// Parse the tag field of a training line.
///
/// Elements are separated by `,,`: `a=b` becomes `(a, b)`, a bare `x`
/// becomes `(x, 1)` and an empty element becomes `(<cell>, 1)`.
pub fn parse_training_tags(s: &str, cell: usize) -> Msd {
    let tags = s
        .split(",,")
        .map(|element| {
            if element.is_empty() {
                Tag::new(cell.to_string(), "1")
            } else if element.contains('=') {
                let mut parts = element.split('=');
                let attribute = parts.next().unwrap_or_default();
                let value = parts.next().unwrap_or_default();
                Tag::new(attribute, value)
            } else {
                Tag::new(element, "1")
            }
        })
        .collect();
    Msd::new(tags)
}

/// Read blank-line separated inflection tables.
///
/// Each line is `lemma<TAB>tags<TAB>form` or a bare form.
pub fn read_training_tables<R: BufRead>(reader: R) -> Result<Vec<InflectionTable>, LoadError> {
    let mut tables = Vec::new();
    let mut forms: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut start = 1;

    let mut flush = |forms: &mut Vec<String>, tags: &mut Vec<String>, start: usize| -> Result<(), LoadError> {
        if forms.is_empty() {
            return Ok(());
        }
        let msds = tags
            .iter()
            .enumerate()
            .map(|(i, t)| parse_training_tags(t, i + 1))
            .collect();
        let table = InflectionTable::new(std::mem::take(forms), msds)
            .map_err(|source| LoadError::Table { line: start, source })?;
        tags.clear();
        tables.push(table);
        Ok(())
    };

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            flush(&mut forms, &mut tags, start)?;
            continue;
        }
        if forms.is_empty() {
            start = line_no;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [form] => {
                forms.push(form.to_string());
                tags.push(String::new());
            }
            [_, tag, form] => {
                forms.push(form.to_string());
                tags.push(tag.to_string());
            }
            _ => {
                return Err(LoadError::Parse {
                    line: line_no,
                    message: format!("expected 1 or 3 tab-separated fields, found {}", fields.len()),
                })
            }
        }
    }
    flush(&mut forms, &mut tags, start)?;

    Ok(tables)
}

pub fn load_training_tables(path: &Path) -> Result<Vec<InflectionTable>, LoadError> {
    let file = File::open(path)?;
    read_training_tables(BufReader::new(file))
}

// ============================================================================
// Paradigm files
// ============================================================================

fn parse_form(s: &str) -> Result<(Template, Msd), String> {
    let (template, msd) = split_form(s);
    let template = parse_template(template).map_err(|e| e.to_string())?;
    let msd = Msd::parse(msd).map_err(|e| e.to_string())?;
    Ok((template, msd))
}

/// Read a paradigm file, one paradigm per line.
///
/// The paradigms are returned by descending count and named
/// `p<rank>_<first member>`.
pub fn read_paradigm_file<R: BufRead>(reader: R) -> Result<Vec<Paradigm>, LoadError> {
    let mut paradigms = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (pattern, examples) = line.split_once('\t').unwrap_or((line, ""));
        let forms = split_unescaped(pattern, '#')
            .into_iter()
            .map(parse_form)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|message| LoadError::Parse { line: line_no, message })?;
        let bindings = if examples.is_empty() {
            Vec::new()
        } else {
            examples
                .split('#')
                .map(Binding::parse)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| LoadError::Paradigm { record: line_no, source })?
        };

        let paradigm = Paradigm::new(forms, bindings)
            .map_err(|source| LoadError::Paradigm { record: line_no, source })?;
        paradigms.push(paradigm);
    }

    paradigms.sort_by(|a, b| b.count().cmp(&a.count()));
    for (rank, p) in paradigms.iter_mut().enumerate() {
        if let Some(first) = p.members().first().cloned() {
            p.set_name(format!("p{}_{}", rank + 1, first));
        }
    }

    Ok(paradigms)
}

pub fn load_paradigm_file(path: &Path) -> Result<Vec<Paradigm>, LoadError> {
    let file = File::open(path)?;
    read_paradigm_file(BufReader::new(file))
}

// ============================================================================
// JSON
// ============================================================================

/// Rebuild a paradigm from its JSON record.
pub fn paradigm_from_record(record: ParadigmRecord) -> Result<Paradigm, ParadigmError> {
    let forms = record
        .transforms
        .into_iter()
        .map(|transform| {
            let template = transform
                .process
                .into_iter()
                .map(|step| match step {
                    ProcessRecord::AddVariable { variable_num, .. } => match variable_num.parse() {
                        Ok(index) if index > 0 => Ok(Token::Var(index)),
                        _ => Err(ParadigmError::InvalidTemplate(variable_num)),
                    },
                    ProcessRecord::AddConstant { string_value, .. } => Ok(Token::Literal(string_value)),
                })
                .collect::<Result<Template, _>>()?;
            let msd = Msd::new(
                transform
                    .features
                    .into_iter()
                    .map(|(k, v)| Tag::new(k, v))
                    .collect(),
            );
            Ok((template, msd))
        })
        .collect::<Result<Vec<_>, ParadigmError>>()?;

    let bindings = record
        .variable_instances
        .into_iter()
        .map(Binding::from_pairs)
        .collect::<Result<Vec<_>, _>>()?;

    let mut paradigm = Paradigm::new(forms, bindings)?
        .with_part_of_speech(record.part_of_speech)
        .with_lexicon(record.lexicon);
    if !record.id.is_empty() {
        paradigm = paradigm.with_name(record.id);
    }
    if !record.uuid.is_empty() {
        paradigm = paradigm.with_uuid(record.uuid);
    }
    for (name, members) in record.classes {
        paradigm.add_class(name, members);
    }
    Ok(paradigm)
}

/// Read a JSON array of paradigm records, keeping their order.
pub fn read_json_paradigms<R: Read>(reader: R) -> Result<Vec<Paradigm>, LoadError> {
    let records: Vec<ParadigmRecord> = serde_json::from_reader(reader)?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            paradigm_from_record(record).map_err(|source| LoadError::Paradigm { record: i + 1, source })
        })
        .collect()
}

pub fn load_json_paradigms(path: &Path) -> Result<Vec<Paradigm>, LoadError> {
    let file = File::open(path)?;
    read_json_paradigms(BufReader::new(file))
}

/// Load a paradigm set in either storage format.
pub fn load_paradigms(path: &Path, format: ParadigmFormat) -> Result<Vec<Paradigm>, LoadError> {
    match format {
        ParadigmFormat::PFile => load_paradigm_file(path),
        ParadigmFormat::Json => load_json_paradigms(path),
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Parse one analysis query.
///
/// A line with tabs alternates words and stored MSDs,
/// `word<TAB>msd<TAB>word<TAB>msd`; any other line is whitespace-separated
/// words. Blank lines give `None`.
pub fn parse_query(line: &str, line_no: usize) -> Result<Option<Query>, LoadError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.contains('\t') {
        return Ok(Some(Query::words(line.split_whitespace())));
    }

    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() % 2 != 0 {
        return Err(LoadError::Parse {
            line: line_no,
            message: format!("expected word<TAB>msd pairs, found {} fields", fields.len()),
        });
    }
    let mut words = Vec::with_capacity(fields.len() / 2);
    let mut tags = Vec::with_capacity(fields.len() / 2);
    for pair in fields.chunks(2) {
        words.push(pair[0].to_string());
        tags.push(Msd::parse(pair[1]).map_err(|source| LoadError::Table { line: line_no, source })?);
    }
    let query = Query::tagged(words, tags).map_err(|source| LoadError::Table { line: line_no, source })?;
    Ok(Some(query))
}

/// Parse a query whose last whitespace-separated field names the member
/// to analyze against, e.g. `bäder bad`. Alternatives are separated by `|`.
pub fn parse_member_query(line: &str, line_no: usize) -> Result<Option<(Query, Vec<String>)>, LoadError> {
    let mut fields: Vec<&str> = line.split_whitespace().collect();
    let Some(member) = fields.pop() else {
        return Ok(None);
    };
    if fields.is_empty() {
        return Err(LoadError::Parse {
            line: line_no,
            message: "expected words followed by a member".to_string(),
        });
    }
    let members = member.split('|').map(str::to_string).collect();
    Ok(Some((Query::words(fields), members)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_training_tags() {
        let msd = parse_training_tags("num=sg,,def", 2);
        assert_eq!(msd.tags(), &[Tag::new("num", "sg"), Tag::new("def", "1")]);
        assert_eq!(parse_training_tags("", 3).tags(), &[Tag::new("3", "1")]);
    }

    #[test]
    fn test_read_training_tables() {
        let input = "stad\tnum=sg\tstad\nstad\tnum=pl\tstäder\n\n\nbil\nbilar\n";
        let tables = read_training_tables(Cursor::new(input)).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].forms(), &["stad".to_string(), "städer".to_string()]);
        assert_eq!(tables[0].tags()[1], Msd::new(vec![Tag::new("num", "pl")]));
        assert_eq!(tables[1].tags()[1], Msd::new(vec![Tag::new("2", "1")]));
    }

    #[test]
    fn test_read_training_tables_rejects_bad_line() {
        let input = "a\tb\n";
        match read_training_tables(Cursor::new(input)) {
            Err(LoadError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_read_paradigm_file_sorts_and_names() {
        let input = "\
1::x#1+s::y\tfirst-attest=bil,,1=bil
1+a+2::x#1+ä+2+er::y\tfirst-attest=stad,,1=st,,2=d#first-attest=bad,,1=b,,2=d
go::x#went::y
";
        let paradigms = read_paradigm_file(Cursor::new(input)).unwrap();
        assert_eq!(paradigms.len(), 3);
        assert_eq!(paradigms[0].name(), "p1_stad");
        assert_eq!(paradigms[0].count(), 2);
        assert_eq!(paradigms[1].name(), "p2_bil");
        assert_eq!(paradigms[2].name(), "p_go");
        assert_eq!(paradigms[2].count(), 0);
        assert_eq!(paradigms[0].forms()[1].msd(), &Msd::new(vec![Tag::bare("y")]));
    }

    #[test]
    fn test_literal_paradigm_survives_paradigm_file() {
        let tags = vec![Msd::from_value("sg"), Msd::from_value("pl")];
        let table = InflectionTable::from_strs(&["12", "a+b"], &tags).unwrap();
        let learned =
            crate::extract::learn_paradigms(&[table], &crate::models::LearnParams::default(), false)
                .unwrap();
        assert_eq!(learned[0].num_vars(), 0);

        let mut buf = Vec::new();
        crate::output::write_paradigms(&learned, &mut buf).unwrap();
        let loaded = read_paradigm_file(Cursor::new(buf)).unwrap();
        assert_eq!(loaded[0].num_vars(), 0);
        assert_eq!(loaded[0].forms()[0].template(), learned[0].forms()[0].template());
        let cells: Vec<String> = loaded[0]
            .instantiate::<&str>(&[])
            .unwrap()
            .into_iter()
            .map(|(form, _)| form)
            .collect();
        assert_eq!(cells, vec!["12", "a+b"]);
    }

    #[test]
    fn test_read_paradigm_file_errors() {
        let bad_template = "0+a::x\n";
        assert!(matches!(
            read_paradigm_file(Cursor::new(bad_template)),
            Err(LoadError::Parse { line: 1, .. })
        ));
        let bad_binding = "1::x\tfirst-attest=a,,1=a,,2=b\n";
        assert!(matches!(
            read_paradigm_file(Cursor::new(bad_binding)),
            Err(LoadError::Paradigm { record: 1, .. })
        ));
    }

    #[test]
    fn test_read_json_paradigms() {
        let json = r#"[{
            "MorphologicalPatternID": "p1_stad",
            "_uuid": "abc",
            "_partOfSpeech": "nn",
            "_lexiconName": "saldo",
            "_entries": 1,
            "VariableInstances": [{"first-attest": "stad", "1": "st", "2": "d"}],
            "TransformCategory": {"gender": ["stad"]},
            "TransformSet": [
                {"Process": [
                    {"operator": "addAfter", "processType": "pextractAddVariable", "variableNum": "1"},
                    {"operator": "addAfter", "processType": "pextractAddConstant", "stringValue": "a"},
                    {"operator": "addAfter", "processType": "pextractAddVariable", "variableNum": "2"}
                 ],
                 "GrammaticalFeatures": {"msd": "sg indef nom"}}
            ]
        }]"#;
        let paradigms = read_json_paradigms(Cursor::new(json)).unwrap();
        assert_eq!(paradigms.len(), 1);
        let p = &paradigms[0];
        assert_eq!(p.name(), "p1_stad");
        assert_eq!(p.uuid(), "abc");
        assert_eq!(p.part_of_speech(), "nn");
        assert_eq!(p.lexicon(), "saldo");
        assert_eq!(p.members(), &["stad".to_string()]);
        assert_eq!(p.pattern(), "1+a+2::msd=sg indef nom");
        assert!(p.classes()["gender"].contains("stad"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1::x#1+s::y\tfirst-attest=bil,,1=bil").unwrap();
        let paradigms = load_paradigms(file.path(), ParadigmFormat::PFile).unwrap();
        assert_eq!(paradigms.len(), 1);
        assert!(matches!(
            load_paradigms(Path::new("/nonexistent/paradigms.p"), ParadigmFormat::Json),
            Err(LoadError::Io(_))
        ));
    }

    #[test]
    fn test_parse_query() {
        assert!(parse_query("  ", 1).unwrap().is_none());

        let query = parse_query("stad  städer", 1).unwrap().unwrap();
        assert_eq!(query.word_list(), &["stad".to_string(), "städer".to_string()]);
        assert!(query.tags().is_empty());

        let query = parse_query("städer\tmsd=pl indef nom", 1).unwrap().unwrap();
        assert_eq!(query.word_list(), &["städer".to_string()]);
        assert_eq!(query.tags(), &[Msd::single("msd", "pl indef nom")]);

        let query = parse_query("stad\tnum=sg\tstäder\tnum=pl,,def=ind", 1).unwrap().unwrap();
        assert_eq!(query.tags()[1].tags(), &[Tag::new("num", "pl"), Tag::new("def", "ind")]);

        match parse_query("stad\tnum=sg\tstäder", 4) {
            Err(LoadError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected result: {:?}", other.map(|q| q.is_some())),
        }
    }

    #[test]
    fn test_parse_member_query() {
        let (query, members) = parse_member_query("bäder bad|bad..1", 1).unwrap().unwrap();
        assert_eq!(query.word_list(), &["bäder".to_string()]);
        assert_eq!(members, vec!["bad", "bad..1"]);

        assert!(parse_member_query("", 1).unwrap().is_none());
        assert!(parse_member_query("bad", 2).is_err());
    }
}
