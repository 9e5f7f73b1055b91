//! Criterion benchmarks for paradigm learning and analysis.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use paradigm_extract::analyze::ParserModel;
use paradigm_extract::bracket::find_factors;
use paradigm_extract::extract::learn_paradigms;
use paradigm_extract::models::{InflectionTable, LearnParams, Msd, ParserParams, Query};
use paradigm_extract::wordgraph::longest_common_subsequences;

const STEMS: [&str; 8] = ["stad", "bad", "hund", "katt", "bil", "båt", "sko", "väg"];

fn noun_table(stem: &str) -> InflectionTable {
    let forms = vec![
        stem.to_string(),
        format!("{}en", stem),
        format!("{}ar", stem),
        format!("{}arna", stem),
        format!("{}s", stem),
        format!("{}ens", stem),
    ];
    let tags = ["sg indef", "sg def", "pl indef", "pl def", "sg indef gen", "sg def gen"]
        .iter()
        .map(|t| Msd::single("msd", *t))
        .collect();
    InflectionTable::new(forms, tags).unwrap()
}

fn bench_lcs(c: &mut Criterion) {
    let mut group = c.benchmark_group("lcs");

    let short = ["stad", "städer", "stads"];
    group.bench_function("short_table", |b| {
        b.iter(|| longest_common_subsequences(black_box(&short)))
    });

    let long = [
        "svälta ihjäl",
        "svälter ihjäl",
        "svalt ihjäl",
        "svultit ihjäl",
        "svälts ihjäl",
    ];
    group.bench_function("phrase_table", |b| {
        b.iter(|| longest_common_subsequences(black_box(&long)))
    });

    group.finish();
}

fn bench_bracketing(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_factors");

    for (word, lcs) in [("städer", "std"), ("abababab", "abab"), ("styrelseledamöter", "styrelseledam")] {
        group.bench_with_input(BenchmarkId::new("word", word), &(word, lcs), |b, &(w, l)| {
            b.iter(|| find_factors(black_box(w), black_box(l)))
        });
    }

    group.finish();
}

fn bench_learning(c: &mut Criterion) {
    let params = LearnParams::default();
    let mut group = c.benchmark_group("learn");

    for n in [8, 64] {
        let tables: Vec<InflectionTable> = STEMS.iter().cycle().take(n).map(|s| noun_table(s)).collect();
        group.bench_with_input(BenchmarkId::new("tables", n), &tables, |b, tables| {
            b.iter(|| learn_paradigms(black_box(tables), &params, false))
        });
    }

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let tables: Vec<InflectionTable> = STEMS.iter().map(|s| noun_table(s)).collect();
    let paradigms = learn_paradigms(&tables, &LearnParams::default(), false).unwrap();
    let params = ParserParams::default();
    let model = ParserModel::from_params(paradigms, &params).unwrap();

    let mut group = c.benchmark_group("analyze");

    let single = Query::words(["fisken"]);
    group.bench_function("single_word", |b| {
        b.iter(|| model.analyze(black_box(&single), &params))
    });

    let several = Query::words(["fisk", "fisken", "fiskarna"]);
    group.bench_function("three_words", |b| {
        b.iter(|| model.analyze(black_box(&several), &params))
    });

    group.finish();
}

criterion_group!(benches, bench_lcs, bench_bracketing, bench_learning, bench_analysis);
criterion_main!(benches);
