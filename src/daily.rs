use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::backtest::BacktestReport;
use crate::config::AppConfig;
use crate::features::FeatureTable;
use crate::market::Market;
use crate::record::MatchRecord;
use crate::strategy::{BoundStrategy, StrategyBank};

/// Why a fixture was picked: the approved strategy and the odds it would take.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub page: String,
    pub strategy: String,
    pub market: Market,
    pub odds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pick {
    pub record: MatchRecord,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyPicks {
    pub fixtures: usize,
    pub approved_rules: usize,
    pub picks: Vec<Pick>,
}

impl DailyPicks {
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

pub fn on_date(fixtures: Vec<MatchRecord>, date: NaiveDate) -> Vec<MatchRecord> {
    fixtures
        .into_iter()
        .filter(|r| r.date == Some(date))
        .collect()
}

/// Keeps the first row of each (League, Home, Away).
pub fn dedupe_fixtures(fixtures: &[MatchRecord]) -> Vec<MatchRecord> {
    let mut seen = HashSet::new();
    fixtures
        .iter()
        .filter(|r| {
            let (league, home, away) = r.fixture_key();
            seen.insert((league.to_string(), home.to_string(), away.to_string()))
        })
        .cloned()
        .collect()
}

/// Applies every approved strategy to the deduplicated fixtures. A fixture
/// matched by several strategies appears once, carrying all of its selections.
pub fn filter_daily(
    fixtures: &[MatchRecord],
    report: &BacktestReport,
    bank: &StrategyBank,
    config: &AppConfig,
) -> DailyPicks {
    let fixtures = dedupe_fixtures(fixtures);
    let features = FeatureTable::derive(&fixtures);
    let mut picks: Vec<Pick> = Vec::new();
    let mut pick_of_row: HashMap<usize, usize> = HashMap::new();
    let mut approved_rules = 0usize;

    for result in report.approved() {
        let (Some(rule), Some(page)) = (
            bank.get(&result.page, &result.strategy),
            config.page(&result.page),
        ) else {
            warn!(
                page = %result.page,
                strategy = %result.strategy,
                "approved strategy missing from bank or config"
            );
            continue;
        };
        approved_rules += 1;

        let bound = BoundStrategy::bind(rule, &features);
        for (idx, keep) in bound.mask().into_iter().enumerate() {
            if !keep {
                continue;
            }
            let record = &fixtures[idx];
            let odds = record.odds.get(page.market);
            if !page.odds_in_range(odds) {
                continue;
            }
            let selection = Selection {
                page: page.name.clone(),
                strategy: rule.name.clone(),
                market: page.market,
                odds,
            };
            match pick_of_row.get(&idx) {
                Some(&pos) => picks[pos].selections.push(selection),
                None => {
                    pick_of_row.insert(idx, picks.len());
                    picks.push(Pick {
                        record: record.clone(),
                        selections: vec![selection],
                    });
                }
            }
        }
    }

    picks.sort_by(|a, b| {
        let (ra, rb) = (&a.record, &b.record);
        (ra.date, ra.kickoff(), &ra.league, &ra.home).cmp(&(
            rb.date,
            rb.kickoff(),
            &rb.league,
            &rb.home,
        ))
    });

    info!(
        fixtures = fixtures.len(),
        approved_rules,
        picks = picks.len(),
        "daily filter finished"
    );

    DailyPicks {
        fixtures: fixtures.len(),
        approved_rules,
        picks,
    }
}
