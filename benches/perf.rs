use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use oddslab::backtest::run_backtest_with_features;
use oddslab::config::AppConfig;
use oddslab::daily::filter_daily;
use oddslab::features::FeatureTable;
use oddslab::loader::read_csv_str;
use oddslab::strategy::StrategyBank;
use oddslab::synthetic::{generate, write_csv};

fn bench_feature_derivation(c: &mut Criterion) {
    let history = generate(1, 5_000);
    c.bench_function("derive_features_5k", |b| {
        b.iter(|| {
            let table = FeatureTable::derive(black_box(&history));
            black_box(table.len());
        })
    });
}

fn bench_backtest(c: &mut Criterion) {
    let config = AppConfig::bundled().expect("bundled config");
    let bank = StrategyBank::bundled().expect("bundled bank");
    let history = generate(2, 5_000);
    let features = FeatureTable::derive(&history);
    c.bench_function("backtest_bank_5k", |b| {
        b.iter(|| {
            let report = run_backtest_with_features(&bank, black_box(&history), &features, &config);
            black_box(report.results.len());
        })
    });
}

fn bench_daily_filter(c: &mut Criterion) {
    let config = AppConfig::bundled().expect("bundled config");
    let bank = StrategyBank::bundled().expect("bundled bank");
    let history = generate(3, 5_000);
    let features = FeatureTable::derive(&history);
    let report = run_backtest_with_features(&bank, &history, &features, &config);
    let fixtures = generate(4, 300);
    c.bench_function("daily_filter_300", |b| {
        b.iter(|| {
            let picks = filter_daily(black_box(&fixtures), &report, &bank, &config);
            black_box(picks.picks.len());
        })
    });
}

fn bench_csv_parse(c: &mut Criterion) {
    let mut buf = Vec::new();
    write_csv(&mut buf, &generate(5, 2_000), true).expect("write csv");
    let raw = String::from_utf8(buf).expect("utf8");
    c.bench_function("csv_parse_2k", |b| {
        b.iter(|| {
            let table = read_csv_str(black_box(&raw)).unwrap();
            black_box(table.rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_feature_derivation,
    bench_backtest,
    bench_daily_filter,
    bench_csv_parse,
);
criterion_main!(perf);
