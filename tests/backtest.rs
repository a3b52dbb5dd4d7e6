mod common;

use approx::assert_relative_eq;

use oddslab::backtest::{WindowStats, run_backtest};
use oddslab::config::AppConfig;
use oddslab::leagues::LeagueFilter;
use oddslab::loader::{TableKind, load_matches};
use oddslab::strategy::{Condition, StrategyBank, StrategyRule};

use common::{fixture_path, record, test_bank, test_config};

fn load_history(config: &AppConfig) -> Vec<oddslab::record::MatchRecord> {
    let (history, _) = load_matches(&fixture_path("history_small.csv"), TableKind::Historical)
        .expect("history should load");
    LeagueFilter::from_config(config).retain(history)
}

#[test]
fn hand_computed_back_home_rule() {
    let config = test_config();
    let history = load_history(&config);
    assert_eq!(history.len(), 4);

    let report = run_backtest(&test_bank(), &history, &config);
    let all = report.find("Back Home", "ALL").expect("ALL evaluated");

    // Chronological: 2.50 win, 3.00 draw, 2.00 win, 1.80 win.
    assert_eq!(all.overall.games, 4);
    assert_eq!(all.overall.hits, 3);
    assert_relative_eq!(all.overall.profit, 2.3, epsilon = 1e-9);
    assert_eq!(all.short.games, 2);
    assert_relative_eq!(all.short.profit, 1.8, epsilon = 1e-9);
    assert_relative_eq!(all.short.hit_rate, 1.0);
    assert_eq!(all.long.games, 3);
    assert_relative_eq!(all.long.profit, 0.8, epsilon = 1e-9);
    assert_relative_eq!(all.long.hit_rate, 2.0 / 3.0, epsilon = 1e-9);
    assert!(all.approved);

    let cumulative: Vec<f64> = all.ledger.iter().map(|r| r.cumulative).collect();
    assert_relative_eq!(cumulative[0], 1.5, epsilon = 1e-9);
    assert_relative_eq!(cumulative[3], 2.3, epsilon = 1e-9);
}

#[test]
fn rule_matching_nothing_is_zero_and_not_approved() {
    let config = test_config();
    let history = load_history(&config);
    let report = run_backtest(&test_bank(), &history, &config);

    let none = report.find("Back Home", "NONE").expect("NONE evaluated");
    assert_eq!(none.overall, WindowStats::default());
    assert!(!none.approved);
    assert!(none.ledger.is_empty());
}

#[test]
fn lay_rule_wins_backers_stake() {
    let config = test_config();
    let history = load_history(&config);
    let report = run_backtest(&test_bank(), &history, &config);

    let lay = report.find("Lay 0x1", "L01").expect("L01 evaluated");
    assert_eq!(lay.overall.games, 4);
    assert_eq!(lay.overall.hits, 4);
    assert_relative_eq!(lay.overall.profit, 4.0);
    assert!(lay.approved);
}

#[test]
fn unknown_page_warns_and_others_still_run() {
    let config = test_config();
    let history = load_history(&config);
    let report = run_backtest(&test_bank(), &history, &config);

    assert_eq!(report.results.len(), 4);
    assert!(report.find_strategy("G1").is_none());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Ghost"));
}

#[test]
fn results_follow_bank_order() {
    let config = test_config();
    let history = load_history(&config);
    let report = run_backtest(&test_bank(), &history, &config);
    let names: Vec<&str> = report.results.iter().map(|r| r.strategy.as_str()).collect();
    assert_eq!(names, ["ALL", "SHORT", "NONE", "L01"]);
}

#[test]
fn empty_history_approves_nothing() {
    let config = test_config();
    let report = run_backtest(&test_bank(), &[], &config);
    assert_eq!(report.history_rows, 0);
    assert_eq!(report.approved_count(), 0);
    assert!(
        report
            .results
            .iter()
            .all(|r| r.overall == WindowStats::default())
    );
}

#[test]
fn windows_hold_all_rows_when_history_is_short() {
    let config = test_config();
    let history = vec![record("A", 2.0, Some((1, 0)))];
    let bank = StrategyBank::new(vec![
        StrategyRule::new("Back Home", "ONE", vec![Condition::new("pH", 0.0, 1.0)])
            .expect("valid rule"),
    ]);
    let report = run_backtest(&bank, &history, &config);
    let result = &report.results[0];
    assert_eq!(result.short, result.overall);
    assert_eq!(result.long, result.overall);
}

#[test]
fn commission_reduces_winnings_only() {
    let mut config = test_config();
    config.commission = 0.05;
    let history = vec![record("A", 3.0, Some((2, 0))), record("B", 3.0, Some((0, 0)))];
    let bank = StrategyBank::new(vec![
        StrategyRule::new("Back Home", "ONE", vec![Condition::new("pH", 0.0, 1.0)])
            .expect("valid rule"),
    ]);
    let report = run_backtest(&bank, &history, &config);
    assert_relative_eq!(report.results[0].overall.profit, 2.0 * 0.95 - 1.0, epsilon = 1e-9);
}

#[test]
fn page_summary_totals_approved_profit() {
    let config = test_config();
    let history = load_history(&config);
    let report = run_backtest(&test_bank(), &history, &config);
    let summaries = report.page_summaries();
    let back_home = summaries
        .iter()
        .find(|s| s.page == "Back Home")
        .expect("page summary");
    assert_eq!(back_home.rules, 3);
    assert_eq!(back_home.approved, 2);
    // ALL long 0.8 plus SHORT long 1.8.
    assert_relative_eq!(back_home.approved_profit_long, 2.6, epsilon = 1e-9);
}
