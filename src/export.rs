use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::backtest::BacktestReport;
use crate::daily::DailyPicks;

pub struct ExportSummary {
    pub strategies: usize,
    pub ledger_rows: usize,
    pub picks: usize,
}

enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::from(*n)).collect()
}

/// Writes backtest results, matched-game ledgers and daily picks into one
/// workbook. The picks sheet is only added when picks are given.
pub fn export_xlsx(
    path: &Path,
    report: &BacktestReport,
    picks: Option<&DailyPicks>,
) -> Result<ExportSummary> {
    let mut summary_rows = vec![header(&[
        "Page", "Strategy", "Market", "Games", "Hits", "HitRate", "Profit", "Games8",
        "HitRate8", "Profit8", "Games40", "HitRate40", "Profit40", "Approved",
    ])];
    let mut ledger_rows = vec![header(&[
        "Page", "Strategy", "Date", "League", "Fixture", "Odds", "Goals_H", "Goals_A", "Hit",
        "Profit", "Cumulative",
    ])];

    for r in &report.results {
        summary_rows.push(vec![
            r.page.as_str().into(),
            r.strategy.as_str().into(),
            r.market.label().into(),
            r.overall.games.into(),
            r.overall.hits.into(),
            r.overall.hit_rate.into(),
            r.overall.profit.into(),
            r.short.games.into(),
            r.short.hit_rate.into(),
            r.short.profit.into(),
            r.long.games.into(),
            r.long.hit_rate.into(),
            r.long.profit.into(),
            if r.approved { "yes" } else { "no" }.into(),
        ]);
        for row in &r.ledger {
            ledger_rows.push(vec![
                r.page.as_str().into(),
                r.strategy.as_str().into(),
                opt_to_string(row.date).into(),
                row.league.as_str().into(),
                row.fixture.as_str().into(),
                row.odds.into(),
                (row.goals_h as usize).into(),
                (row.goals_a as usize).into(),
                if row.hit { "Y" } else { "N" }.into(),
                row.profit.into(),
                row.cumulative.into(),
            ]);
        }
    }

    let mut pick_rows = vec![header(&[
        "Date", "Time", "League", "Home", "Away", "Page", "Strategy", "Market", "Odds",
    ])];
    if let Some(picks) = picks {
        for pick in &picks.picks {
            for sel in &pick.selections {
                pick_rows.push(vec![
                    opt_to_string(pick.record.date).into(),
                    pick.record.time.as_str().into(),
                    pick.record.league.as_str().into(),
                    pick.record.home.as_str().into(),
                    pick.record.away.as_str().into(),
                    sel.page.as_str().into(),
                    sel.strategy.as_str().into(),
                    sel.market.label().into(),
                    sel.odds.into(),
                ]);
            }
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Ledger")?;
        write_rows(sheet, &ledger_rows)?;
    }
    if picks.is_some() {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Picks")?;
        write_rows(sheet, &pick_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportSummary {
        strategies: summary_rows.len() - 1,
        ledger_rows: ledger_rows.len() - 1,
        picks: pick_rows.len() - 1,
    })
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(text) => worksheet.write_string(r, c, text),
                Cell::Number(n) if n.is_finite() => worksheet.write_number(r, c, *n),
                Cell::Number(_) => worksheet.write_string(r, c, ""),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
