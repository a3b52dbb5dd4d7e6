mod common;

use chrono::NaiveDate;

use oddslab::backtest::run_backtest;
use oddslab::daily::{filter_daily, on_date};
use oddslab::leagues::LeagueFilter;
use oddslab::loader::{TableKind, load_matches};
use oddslab::session::{Session, SessionInput};

use common::{fixture_path, record, test_bank, test_config};

#[test]
fn picks_are_deduplicated_and_sorted() {
    let config = test_config();
    let bank = test_bank();
    let input = SessionInput {
        history: fixture_path("history_small.csv"),
        fixtures: Some(fixture_path("fixtures_small.csv")),
        date: NaiveDate::from_ymd_opt(2024, 2, 1),
        page: None,
    };
    let session = Session::run(&config, bank, &input).unwrap();
    let picks = session.picks.expect("daily filter ran");

    // Gamma v Delta is listed twice; only its first row counts.
    assert_eq!(picks.fixtures, 2);
    assert_eq!(picks.approved_rules, 3);
    assert_eq!(picks.picks.len(), 2);

    let first = &picks.picks[0];
    assert_eq!(first.record.home, "Epsilon");
    let names: Vec<&str> = first.selections.iter().map(|s| s.strategy.as_str()).collect();
    assert_eq!(names, ["ALL", "L01"]);

    let second = &picks.picks[1];
    assert_eq!(second.record.home, "Gamma");
    assert_eq!(second.selections.len(), 3);
    assert_eq!(second.record.odds.values[0], 1.90);
}

#[test]
fn fixtures_with_missing_columns_keep_backtest() {
    let config = test_config();
    let input = SessionInput {
        history: fixture_path("history_small.csv"),
        fixtures: Some(fixture_path("test_strategies.csv")),
        ..SessionInput::default()
    };
    let session = Session::run(&config, test_bank(), &input).unwrap();
    assert!(session.picks.is_none());
    assert_eq!(session.report.results.len(), 4);
    assert!(session.log.iter().any(|l| l.contains("Daily filter skipped")));
}

#[test]
fn no_approved_rules_means_no_picks() {
    let config = test_config();
    let bank = test_bank();
    let report = run_backtest(&bank, &[], &config);
    let fixtures = vec![record("A", 2.0, None), record("B", 1.5, None)];
    let picks = filter_daily(&fixtures, &report, &bank, &config);
    assert!(picks.is_empty());
    assert_eq!(picks.fixtures, 2);
    assert_eq!(picks.approved_rules, 0);
}

#[test]
fn date_filter_keeps_one_day() {
    let config = test_config();
    let (fixtures, _) =
        load_matches(&fixture_path("fixtures_small.csv"), TableKind::Fixtures).unwrap();
    let fixtures = LeagueFilter::from_config(&config).retain(fixtures);
    let day = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
    let kept = on_date(fixtures, day);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].home, "Eta");
}

#[test]
fn duplicate_fixture_rows_only_price_from_the_kept_row() {
    let config = test_config();
    let bank = test_bank();
    let (history, _) =
        load_matches(&fixture_path("history_small.csv"), TableKind::Historical).unwrap();
    let history = LeagueFilter::from_config(&config).retain(history);
    let report = run_backtest(&bank, &history, &config);

    // SHORT (home odds 1.0-2.2) only matches the dropped second row.
    let fixtures = vec![record("Gamma", 3.0, None), record("Gamma", 2.0, None)];
    let picks = filter_daily(&fixtures, &report, &bank, &config);

    assert_eq!(picks.fixtures, 1);
    assert_eq!(picks.picks.len(), 1);
    let pick = &picks.picks[0];
    assert_eq!(pick.record.odds.values[0], 3.0);
    let names: Vec<&str> = pick.selections.iter().map(|s| s.strategy.as_str()).collect();
    assert_eq!(names, ["ALL", "L01"]);
    let all = &pick.selections[0];
    assert_eq!(all.odds, 3.0);
}

#[test]
fn picks_order_by_clock_time() {
    let config = test_config();
    let bank = test_bank();
    let (history, _) =
        load_matches(&fixture_path("history_small.csv"), TableKind::Historical).unwrap();
    let history = LeagueFilter::from_config(&config).retain(history);
    let report = run_backtest(&bank, &history, &config);

    let mut late = record("Late", 2.0, None);
    late.time = "15:00".to_string();
    let mut early = record("Early", 2.0, None);
    early.time = "9:30".to_string();
    let picks = filter_daily(&[late, early], &report, &bank, &config);
    let homes: Vec<&str> = picks.picks.iter().map(|p| p.record.home.as_str()).collect();
    assert_eq!(homes, ["Early", "Late"]);
}

#[test]
fn unreadable_fixtures_file_fails_the_run() {
    let config = test_config();
    let input = SessionInput {
        history: fixture_path("history_small.csv"),
        fixtures: Some(fixture_path("no_such_fixtures.csv")),
        ..SessionInput::default()
    };
    assert!(Session::run(&config, test_bank(), &input).is_err());
}
