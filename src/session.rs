//! One end-to-end run: load history, filter leagues, backtest, then
//! optionally filter the day's fixtures with the approved strategies.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::warn;

use crate::backtest::{self, BacktestReport};
use crate::config::AppConfig;
use crate::daily::{self, DailyPicks};
use crate::error::Result;
use crate::leagues::LeagueFilter;
use crate::loader::{self, LoadReport, TableKind};
use crate::record::MatchRecord;
use crate::strategy::StrategyBank;

#[derive(Debug, Clone, Default)]
pub struct SessionInput {
    pub history: PathBuf,
    pub fixtures: Option<PathBuf>,
    pub date: Option<NaiveDate>,
    pub page: Option<String>,
}

#[derive(Debug)]
pub struct Session<'a> {
    pub config: &'a AppConfig,
    pub bank: StrategyBank,
    pub history: Vec<MatchRecord>,
    pub history_load: LoadReport,
    pub report: BacktestReport,
    pub fixtures: Vec<MatchRecord>,
    pub picks: Option<DailyPicks>,
    /// User-facing warnings collected along the way.
    pub log: Vec<String>,
}

impl<'a> Session<'a> {
    /// Unreadable files abort the run. A fixtures file missing required
    /// columns only skips the daily step; the backtest is still returned.
    pub fn run(config: &'a AppConfig, mut bank: StrategyBank, input: &SessionInput) -> Result<Self> {
        let mut log = Vec::new();
        if let Some(page) = input.page.as_deref() {
            bank.retain_page(page);
            if bank.is_empty() {
                log.push(format!("[WARN] No strategies on page {page:?}"));
            }
        }

        let leagues = LeagueFilter::from_config(config);
        let (history, history_load) = loader::load_matches(&input.history, TableKind::Historical)?;
        log.extend(history_load.warnings().into_iter().map(|w| format!("[WARN] History: {w}")));
        let history = leagues.retain(history);
        if history.is_empty() {
            log.push("[WARN] No historical rows left after filtering".to_string());
        }

        let report = backtest::run_backtest(&bank, &history, config);
        log.extend(report.warnings.iter().map(|w| format!("[WARN] {w}")));
        log.push(format!(
            "[INFO] {} of {} strategies approved on {} historical rows",
            report.approved_count(),
            report.results.len(),
            report.history_rows
        ));

        let mut fixtures = Vec::new();
        let mut picks = None;
        if let Some(path) = input.fixtures.as_deref() {
            match loader::load_matches(path, TableKind::Fixtures) {
                Ok((rows, load)) => {
                    log.extend(load.warnings().into_iter().map(|w| format!("[WARN] Fixtures: {w}")));
                    let mut rows = leagues.retain(rows);
                    if let Some(date) = input.date {
                        rows = daily::on_date(rows, date);
                    }
                    let daily = daily::filter_daily(&rows, &report, &bank, config);
                    log.push(format!(
                        "[INFO] {} pick(s) from {} fixture(s)",
                        daily.picks.len(),
                        daily.fixtures
                    ));
                    fixtures = rows;
                    picks = Some(daily);
                }
                Err(err) if err.is_missing_columns() => {
                    warn!("daily filter skipped: {err}");
                    log.push(format!("[WARN] Daily filter skipped: {err}"));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Self {
            config,
            bank,
            history,
            history_load,
            report,
            fixtures,
            picks,
            log,
        })
    }
}
