#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use oddslab::config::AppConfig;
use oddslab::market::Market;
use oddslab::record::{MatchRecord, Odds};
use oddslab::strategy::StrategyBank;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

pub fn test_config() -> AppConfig {
    AppConfig::from_toml_str(&read_fixture("test_config.toml")).expect("test config should parse")
}

pub fn test_bank() -> StrategyBank {
    StrategyBank::from_csv_reader(read_fixture("test_strategies.csv").as_bytes())
        .expect("test bank should parse")
}

/// A record with flat odds of 2.0 everywhere except the home price.
pub fn record(home: &str, odd_home: f64, score: Option<(u32, u32)>) -> MatchRecord {
    let mut values = [2.0; 10];
    values[Market::BackHome.index()] = odd_home;
    MatchRecord {
        league: "ENGLAND - PREMIER LEAGUE".to_string(),
        home: home.to_string(),
        away: format!("{home} Away"),
        time: "15:00".to_string(),
        date: None,
        odds: Odds { values },
        goals_h: score.map(|s| s.0),
        goals_a: score.map(|s| s.1),
    }
}
