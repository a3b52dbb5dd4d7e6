//! Spreadsheet loading: `.csv` (comma or semicolon) and Excel/ODS workbooks
//! into `MatchRecord`s.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::error::{LabError, Result};
use crate::market::Market;
use crate::record::{MatchRecord, Odds};

pub const COL_LEAGUE: &str = "League";
pub const COL_HOME: &str = "Home";
pub const COL_AWAY: &str = "Away";
pub const COL_TIME: &str = "Time";
pub const COL_DATE: &str = "Date";
pub const COL_GOALS_H: &str = "Goals_H";
pub const COL_GOALS_A: &str = "Goals_A";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Past matches; final goals are required.
    Historical,
    /// Same-day fixtures; goals are ignored when present.
    Fixtures,
}

/// Cells as text, exactly as read from the file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Set for semicolon-delimited files, where `1,85` means 1.85.
    pub decimal_comma: bool,
}

impl RawTable {
    pub fn column_index(&self) -> HashMap<&str, usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub loaded: usize,
    pub skipped_odds: usize,
    pub skipped_results: usize,
}

impl LoadReport {
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.skipped_odds > 0 {
            out.push(format!(
                "{} row(s) skipped: missing or invalid odds (must be > 1)",
                self.skipped_odds
            ));
        }
        if self.skipped_results > 0 {
            out.push(format!(
                "{} row(s) skipped: missing final score",
                self.skipped_results
            ));
        }
        out
    }
}

pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => {
            let raw = fs::read_to_string(path).map_err(|err| LabError::io(path, err))?;
            read_csv_str(&raw)
        }
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path),
        _ => Err(LabError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

pub fn load_matches(path: &Path, kind: TableKind) -> Result<(Vec<MatchRecord>, LoadReport)> {
    let table = load_table(path)?;
    debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.headers.len(),
        "table loaded"
    );
    parse_matches(&table, kind)
}

pub fn detect_delimiter(header_line: &str) -> u8 {
    let semis = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semis > commas { b';' } else { b',' }
}

pub fn read_csv_str(raw: &str) -> Result<RawTable> {
    let raw = raw.trim_start_matches('\u{feff}');
    let header_line = raw.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable {
        headers,
        rows,
        decimal_comma: delimiter == b';',
    })
}

fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LabError::EmptyWorkbook {
            path: path.to_path_buf(),
        })??;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Ok(RawTable::default());
    };
    let headers = header_row
        .iter()
        .map(|cell| cell_text(cell).trim().to_string())
        .collect::<Vec<_>>();

    let rows = rows_iter
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    Ok(RawTable {
        headers,
        rows,
        decimal_comma: false,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_text(dt.as_f64()),
        other => other.to_string(),
    }
}

/// Excel stores dates as days since 1899-12-30 and times as day fractions.
fn excel_serial_text(serial: f64) -> String {
    if serial.trunc() == 0.0 {
        let minutes = (serial * 24.0 * 60.0).round() as i64;
        return format!("{:02}:{:02}", minutes / 60, minutes % 60);
    }
    match excel_serial_date(serial) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => serial.to_string(),
    }
}

// 2958465 is 9999-12-31, the last date Excel can hold.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

pub fn parse_number(raw: &str, decimal_comma: bool) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if decimal_comma {
        trimmed.replace(',', ".").parse::<f64>()
    } else {
        trimmed.parse::<f64>()
    };
    parsed.ok().filter(|v| v.is_finite())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Datetimes like "2024-03-01 15:00:00" keep only the date part.
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .or_else(|| date_part.parse::<f64>().ok().and_then(excel_serial_date))
}

/// Stable sort on (date, kickoff). A row without a date keeps the key of the
/// row above it, so it stays at its file position. A row with an unreadable
/// time borrows the previous kickoff of the same day.
fn sort_chronologically(records: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut last: (Option<NaiveDate>, Option<NaiveTime>) = (None, None);
    let mut keyed = Vec::with_capacity(records.len());
    for record in records {
        let key = match record.date {
            Some(date) => {
                let carried = if last.0 == Some(date) { last.1 } else { None };
                (Some(date), record.kickoff().or(carried))
            }
            None => last,
        };
        last = key;
        keyed.push((key, record));
    }
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, record)| record).collect()
}

fn parse_goals(raw: &str, decimal_comma: bool) -> Option<u32> {
    let value = parse_number(raw, decimal_comma)?;
    if value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    Some(value as u32)
}

/// Fails when any odds column is absent; the whole table is rejected.
pub fn require_columns(headers: &[String], kind: TableKind) -> Result<()> {
    let mut required = vec![COL_LEAGUE, COL_HOME, COL_AWAY, COL_TIME];
    if kind == TableKind::Historical {
        required.push(COL_GOALS_H);
        required.push(COL_GOALS_A);
    }
    required.extend(Market::ALL.iter().map(|m| m.odds_column()));

    let missing = required
        .into_iter()
        .filter(|name| !headers.iter().any(|h| h == name))
        .map(str::to_string)
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LabError::MissingColumns { columns: missing })
    }
}

pub fn parse_matches(table: &RawTable, kind: TableKind) -> Result<(Vec<MatchRecord>, LoadReport)> {
    require_columns(&table.headers, kind)?;

    let index = table.column_index();
    let col = |name: &str| index.get(name).copied();
    let required = |name: &str| {
        col(name).ok_or_else(|| LabError::MissingColumns {
            columns: vec![name.to_string()],
        })
    };
    let league_idx = required(COL_LEAGUE)?;
    let home_idx = required(COL_HOME)?;
    let away_idx = required(COL_AWAY)?;
    let time_idx = required(COL_TIME)?;
    let date_idx = col(COL_DATE);
    let goals_idx = col(COL_GOALS_H).zip(col(COL_GOALS_A));
    let mut odds_idx = [0usize; 10];
    for (slot, market) in odds_idx.iter_mut().zip(Market::ALL) {
        *slot = required(market.odds_column())?;
    }

    let mut report = LoadReport {
        rows_read: table.rows.len(),
        ..LoadReport::default()
    };
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let mut values = [0.0_f64; 10];
        let mut odds_ok = true;
        for (slot, idx) in values.iter_mut().zip(odds_idx) {
            match parse_number(cell(idx), table.decimal_comma) {
                Some(v) if v > 1.0 => *slot = v,
                _ => {
                    odds_ok = false;
                    break;
                }
            }
        }
        if !odds_ok {
            report.skipped_odds += 1;
            continue;
        }

        let goals = goals_idx.and_then(|(h, a)| {
            Some((
                parse_goals(cell(h), table.decimal_comma)?,
                parse_goals(cell(a), table.decimal_comma)?,
            ))
        });
        let (goals_h, goals_a) = match (kind, goals) {
            (TableKind::Historical, None) => {
                report.skipped_results += 1;
                continue;
            }
            (_, Some((h, a))) => (Some(h), Some(a)),
            (TableKind::Fixtures, None) => (None, None),
        };

        records.push(MatchRecord {
            league: cell(league_idx).trim().to_string(),
            home: cell(home_idx).trim().to_string(),
            away: cell(away_idx).trim().to_string(),
            time: cell(time_idx).trim().to_string(),
            date: date_idx.and_then(|idx| parse_date(cell(idx))),
            odds: Odds { values },
            goals_h,
            goals_a,
        });
    }

    if kind == TableKind::Historical && records.iter().any(|r| r.date.is_some()) {
        records = sort_chronologically(records);
    }

    report.loaded = records.len();
    for warning in report.warnings() {
        warn!("{warning}");
    }
    Ok((records, report))
}
