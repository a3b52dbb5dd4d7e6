//! Fixed-width text tables for the terminal.

use std::fmt::Write;

use crate::backtest::{BacktestReport, BacktestResult, LedgerRow};
use crate::daily::DailyPicks;
use crate::features::FeatureTable;
use crate::record::MatchRecord;

pub fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

pub fn signed(v: f64) -> String {
    format!("{v:+.2}")
}

pub fn date_label(row: &LedgerRow) -> String {
    row.date.map(|d| d.to_string()).unwrap_or_else(|| format!("#{}", row.row + 1))
}

pub fn page_table(report: &BacktestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<18} {:<16} {:>6} {:>9} {:>12}",
        "Page", "Market", "Rules", "Approved", "Profit L40"
    );
    for s in report.page_summaries() {
        let _ = writeln!(
            out,
            "{:<18} {:<16} {:>6} {:>9} {:>12}",
            truncate(&s.page, 18),
            s.market.label(),
            s.rules,
            s.approved,
            signed(s.approved_profit_long)
        );
    }
    out
}

pub fn summary_table(report: &BacktestReport, approved_only: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<12} {:>6} {:>7} {:>9} {:>7} {:>9} {:>7} {:>9} {:>7} {}",
        "Page", "Strategy", "Games", "Hit", "Profit", "Hit8", "Profit8", "Hit40", "Profit40", "ROI", "OK"
    );
    for r in report
        .results
        .iter()
        .filter(|r| !approved_only || r.approved)
    {
        let _ = writeln!(
            out,
            "{:<16} {:<12} {:>6} {:>7} {:>9} {:>7} {:>9} {:>7} {:>9} {:>7} {}",
            truncate(&r.page, 16),
            truncate(&r.strategy, 12),
            r.overall.games,
            pct(r.overall.hit_rate),
            signed(r.overall.profit),
            pct(r.short.hit_rate),
            signed(r.short.profit),
            pct(r.long.hit_rate),
            signed(r.long.profit),
            pct(r.overall.roi()),
            if r.approved { "yes" } else { "-" }
        );
    }
    out
}

/// Latest `limit` matched games with running profit.
pub fn detail_table(result: &BacktestResult, limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} / {} ({}) games={} profit={} L{}={} L{}={}",
        result.page,
        result.strategy,
        result.market.label(),
        result.overall.games,
        signed(result.overall.profit),
        result.short.games,
        signed(result.short.profit),
        result.long.games,
        signed(result.long.profit),
    );
    if result.ledger.is_empty() {
        let _ = writeln!(out, "no matched games");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<11} {:<28} {:>7} {:>5} {:>4} {:>8} {:>9}",
        "Date", "Fixture", "Odds", "Score", "Hit", "Profit", "Cumul."
    );
    let start = result.ledger.len().saturating_sub(limit);
    for row in &result.ledger[start..] {
        let _ = writeln!(
            out,
            "{:<11} {:<28} {:>7.2} {:>5} {:>4} {:>8} {:>9}",
            date_label(row),
            truncate(&row.fixture, 28),
            row.odds,
            format!("{}-{}", row.goals_h, row.goals_a),
            if row.hit { "Y" } else { "N" },
            signed(row.profit),
            signed(row.cumulative)
        );
    }
    out
}

pub fn picks_table(picks: &DailyPicks) -> String {
    let mut out = String::new();
    if picks.is_empty() {
        let _ = writeln!(
            out,
            "No recommended bets ({} fixtures, {} approved strategies)",
            picks.fixtures, picks.approved_rules
        );
        return out;
    }
    let _ = writeln!(
        out,
        "{:<6} {:<24} {:<30} {:<16} {:>7} {}",
        "Time", "League", "Fixture", "Market", "Odds", "Strategies"
    );
    for pick in &picks.picks {
        let Some(first) = pick.selections.first() else {
            continue;
        };
        let strategies = pick
            .selections
            .iter()
            .map(|s| s.strategy.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "{:<6} {:<24} {:<30} {:<16} {:>7.2} {}",
            truncate(&pick.record.time, 6),
            truncate(&pick.record.league, 24),
            truncate(&pick.record.fixture_label(), 30),
            first.market.label(),
            first.odds,
            strategies
        );
    }
    out
}

pub fn feature_dump(record: &MatchRecord, features: &FeatureTable, row: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} | {} | {}",
        record.league,
        record.fixture_label(),
        record.time
    );
    for (name, value) in features.row(row) {
        let _ = writeln!(out, "{name:<22} {value:>12.6}");
    }
    out
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('~');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("Back Home", 16), "Back Home");
        assert_eq!(truncate("ENGLAND - PREMIER LEAGUE", 10), "ENGLAND -~");
    }

    #[test]
    fn empty_picks_table_says_so() {
        let text = picks_table(&DailyPicks::default());
        assert!(text.starts_with("No recommended bets"));
    }

    #[test]
    fn formats_percent_and_sign() {
        assert_eq!(pct(0.625), "62.5%");
        assert_eq!(signed(1.5), "+1.50");
        assert_eq!(signed(-1.0), "-1.00");
    }
}
