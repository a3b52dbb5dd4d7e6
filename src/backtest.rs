use std::env;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, ApprovalCriteria, PageConfig};
use crate::features::FeatureTable;
use crate::market::Market;
use crate::record::MatchRecord;
use crate::strategy::{StrategyBank, StrategyRule};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindowStats {
    pub games: usize,
    pub hits: usize,
    pub hit_rate: f64,
    pub profit: f64,
}

impl WindowStats {
    pub fn from_ledger(rows: &[LedgerRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let games = rows.len();
        let hits = rows.iter().filter(|r| r.hit).count();
        Self {
            games,
            hits,
            hit_rate: hits as f64 / games as f64,
            profit: rows.iter().map(|r| r.profit).sum(),
        }
    }

    /// Profit per unit staked.
    pub fn roi(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.profit / self.games as f64
        }
    }
}

/// One matched historical game, in chronological order.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub row: usize,
    pub date: Option<NaiveDate>,
    pub league: String,
    pub fixture: String,
    pub odds: f64,
    pub goals_h: u32,
    pub goals_a: u32,
    pub hit: bool,
    pub profit: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub page: String,
    pub strategy: String,
    pub market: Market,
    pub overall: WindowStats,
    pub short: WindowStats,
    pub long: WindowStats,
    pub approved: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ledger: Vec<LedgerRow>,
}

impl BacktestResult {
    pub fn empty(rule: &StrategyRule, market: Market) -> Self {
        Self {
            page: rule.page.clone(),
            strategy: rule.name.clone(),
            market,
            overall: WindowStats::default(),
            short: WindowStats::default(),
            long: WindowStats::default(),
            approved: false,
            ledger: Vec::new(),
        }
    }
}

pub fn is_approved(
    criteria: &ApprovalCriteria,
    overall: &WindowStats,
    short: &WindowStats,
    long: &WindowStats,
) -> bool {
    overall.games > 0
        && overall.games >= criteria.min_games
        && short.profit > criteria.min_profit_short
        && long.profit > criteria.min_profit_long
        && short.hit_rate >= criteria.min_hit_rate_short
        && long.hit_rate >= criteria.min_hit_rate_long
}

fn tail(rows: &[LedgerRow], n: usize) -> &[LedgerRow] {
    &rows[rows.len().saturating_sub(n)..]
}

/// Evaluates one rule against chronologically ordered history.
///
/// Rows must have final scores; rows without one are ignored. An empty match
/// set yields zeroed statistics and is never approved.
pub fn evaluate_rule(
    rule: &StrategyRule,
    page: &PageConfig,
    history: &[MatchRecord],
    features: &FeatureTable,
    config: &AppConfig,
) -> BacktestResult {
    let market = page.market;
    if history.is_empty() || features.len() != history.len() {
        return BacktestResult::empty(rule, market);
    }

    let mask = rule.mask(features);
    let mut ledger = Vec::new();
    let mut cumulative = 0.0;
    for (idx, (record, keep)) in history.iter().zip(mask).enumerate() {
        if !keep {
            continue;
        }
        let odds = record.odds.get(market);
        if !page.odds_in_range(odds) {
            continue;
        }
        let Some((goals_h, goals_a)) = record.result() else {
            continue;
        };
        let hit = market.outcome_hit(goals_h, goals_a);
        let profit = market.settle(odds, hit, config.commission);
        cumulative += profit;
        ledger.push(LedgerRow {
            row: idx,
            date: record.date,
            league: record.league.clone(),
            fixture: record.fixture_label(),
            odds,
            goals_h,
            goals_a,
            hit,
            profit,
            cumulative,
        });
    }

    let overall = WindowStats::from_ledger(&ledger);
    let short = WindowStats::from_ledger(tail(&ledger, config.windows.short));
    let long = WindowStats::from_ledger(tail(&ledger, config.windows.long));
    let approved = is_approved(&page.approval, &overall, &short, &long);

    BacktestResult {
        page: rule.page.clone(),
        strategy: rule.name.clone(),
        market,
        overall,
        short,
        long,
        approved,
        ledger,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub page: String,
    pub market: Market,
    pub rules: usize,
    pub approved: usize,
    pub approved_profit_long: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BacktestReport {
    pub history_rows: usize,
    pub results: Vec<BacktestResult>,
    pub warnings: Vec<String>,
}

impl BacktestReport {
    pub fn approved(&self) -> impl Iterator<Item = &BacktestResult> {
        self.results.iter().filter(|r| r.approved)
    }

    pub fn approved_count(&self) -> usize {
        self.approved().count()
    }

    pub fn find(&self, page: &str, strategy: &str) -> Option<&BacktestResult> {
        self.results
            .iter()
            .find(|r| r.page == page && r.strategy == strategy)
    }

    pub fn find_strategy(&self, strategy: &str) -> Option<&BacktestResult> {
        self.results.iter().find(|r| r.strategy == strategy)
    }

    pub fn page_summaries(&self) -> Vec<PageSummary> {
        let mut out: Vec<PageSummary> = Vec::new();
        for result in &self.results {
            let idx = match out.iter().position(|s| s.page == result.page) {
                Some(idx) => idx,
                None => {
                    out.push(PageSummary {
                        page: result.page.clone(),
                        market: result.market,
                        rules: 0,
                        approved: 0,
                        approved_profit_long: 0.0,
                    });
                    out.len() - 1
                }
            };
            let summary = &mut out[idx];
            summary.rules += 1;
            if result.approved {
                summary.approved += 1;
                summary.approved_profit_long += result.long.profit;
            }
        }
        out
    }

    /// Drops per-row ledgers, keeping only aggregate statistics.
    pub fn without_ledgers(&self) -> Self {
        let mut out = self.clone();
        for result in &mut out.results {
            result.ledger.clear();
        }
        out
    }
}

/// Evaluates every rule in the bank. Rules whose page is not configured are
/// reported as warnings and skipped; the rest still run.
pub fn run_backtest(
    bank: &StrategyBank,
    history: &[MatchRecord],
    config: &AppConfig,
) -> BacktestReport {
    let features = FeatureTable::derive(history);
    run_backtest_with_features(bank, history, &features, config)
}

pub fn run_backtest_with_features(
    bank: &StrategyBank,
    history: &[MatchRecord],
    features: &FeatureTable,
    config: &AppConfig,
) -> BacktestReport {
    let mut warnings = Vec::new();
    let mut jobs: Vec<(&StrategyRule, &PageConfig)> = Vec::with_capacity(bank.len());
    for rule in bank.rules() {
        match config.page(&rule.page) {
            Some(page) => jobs.push((rule, page)),
            None => {
                let msg = format!(
                    "strategy {} skipped: page {:?} is not configured",
                    rule.name, rule.page
                );
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    if history.is_empty() {
        info!("history is empty; every strategy evaluates to zero");
    }

    let results = with_backtest_pool(|| {
        jobs.par_iter()
            .map(|(rule, page)| evaluate_rule(rule, page, history, features, config))
            .collect::<Vec<_>>()
    });

    let approved = results.iter().filter(|r| r.approved).count();
    info!(
        rules = results.len(),
        approved,
        history = history.len(),
        "backtest finished"
    );

    BacktestReport {
        history_rows: history.len(),
        results,
        warnings,
    }
}

fn with_backtest_pool<T>(action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let threads = backtest_parallelism();
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(err) => {
            debug!("rayon pool unavailable ({err}); running on the caller thread");
            action()
        }
    }
}

fn backtest_parallelism() -> usize {
    env::var("BACKTEST_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(1, 32)
}
