mod common;

use std::fs;

use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;

use oddslab::LabError;
use oddslab::loader::{TableKind, load_matches, load_table};

use common::{fixture_path, read_fixture};

#[test]
fn history_is_sorted_and_bad_rows_counted() {
    let (records, report) =
        load_matches(&fixture_path("history_small.csv"), TableKind::Historical).unwrap();
    assert_eq!(report.rows_read, 6);
    assert_eq!(report.skipped_odds, 1);
    assert_eq!(report.loaded, 5);
    assert_eq!(records.len(), 5);

    let dates: Vec<_> = records.iter().filter_map(|r| r.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_eq!(records[0].home, "Gamma");
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
}

#[test]
fn semicolon_file_with_decimal_commas() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.csv");
    let raw = read_fixture("history_small.csv");
    let converted: String = raw
        .lines()
        .map(|line| {
            // Decimal points become commas once the delimiter is a semicolon.
            let cells: Vec<String> = line.split(',').map(|c| c.replace('.', ",")).collect();
            cells.join(";") + "\n"
        })
        .collect();
    fs::write(&path, converted).unwrap();

    let (records, _) = load_matches(&path, TableKind::Historical).unwrap();
    assert_eq!(records.len(), 5);
    let gamma = records.iter().find(|r| r.home == "Gamma").unwrap();
    assert_eq!(gamma.odds.values[0], 2.5);
}

#[test]
fn missing_columns_are_all_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    let raw = read_fixture("history_small.csv")
        .replace("Odd_CS_0x1_Lay", "CS01")
        .replace("Goals_A", "GA");
    fs::write(&path, raw).unwrap();

    let err = load_matches(&path, TableKind::Historical).unwrap_err();
    match err {
        LabError::MissingColumns { columns } => {
            assert_eq!(columns, ["Goals_A", "Odd_CS_0x1_Lay"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    fs::write(&path, "{}").unwrap();
    assert!(matches!(
        load_table(&path),
        Err(LabError::UnsupportedFormat { .. })
    ));
}

#[test]
fn reads_first_worksheet_of_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixtures.xlsx");
    let raw = read_fixture("fixtures_small.csv");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, line) in raw.lines().enumerate() {
        for (c, cell) in line.split(',').enumerate() {
            match cell.parse::<f64>() {
                Ok(n) if r > 0 => sheet.write_number(r as u32, c as u16, n),
                _ => sheet.write_string(r as u32, c as u16, cell),
            }
            .unwrap();
        }
    }
    workbook.save(&path).unwrap();

    let (records, report) = load_matches(&path, TableKind::Fixtures).unwrap();
    assert_eq!(report.loaded, 5);
    assert_eq!(records[0].home, "Gamma");
    assert_eq!(records[0].odds.values[0], 1.9);
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 2, 1));
}

fn history_with_rows(rows: &[(&str, &str, &str)]) -> String {
    let raw = read_fixture("history_small.csv");
    let header = raw.lines().next().unwrap();
    let mut out = format!("{header}\n");
    for (date, time, home) in rows {
        out.push_str(&format!(
            "{date},ENGLAND - PREMIER LEAGUE,{time},{home},Away,1,0,2.00,3.40,3.50,1.90,1.95,1.85,2.00,10.0,12.0,9.0\n"
        ));
    }
    out
}

fn load_homes(raw: &str) -> Vec<String> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.csv");
    fs::write(&path, raw).unwrap();
    let (records, _) = load_matches(&path, TableKind::Historical).unwrap();
    records.into_iter().map(|r| r.home).collect()
}

#[test]
fn kickoff_times_sort_as_clock_times() {
    let raw = history_with_rows(&[
        ("2024-01-01", "15:00", "Late"),
        ("2024-01-01", "9:30", "Early"),
        ("2023-12-31", "20:00", "DayBefore"),
    ]);
    assert_eq!(load_homes(&raw), ["DayBefore", "Early", "Late"]);
}

#[test]
fn undated_rows_keep_their_file_position() {
    let raw = history_with_rows(&[
        ("2024-01-01", "15:00", "First"),
        ("2024-01-02", "15:00", "Second"),
        ("", "12:00", "NewestUndated"),
    ]);
    assert_eq!(load_homes(&raw), ["First", "Second", "NewestUndated"]);

    // An undated row sticks to the row above it when that row moves.
    let raw = history_with_rows(&[
        ("2024-01-02", "15:00", "Second"),
        ("", "", "AfterSecond"),
        ("2024-01-01", "15:00", "First"),
    ]);
    assert_eq!(load_homes(&raw), ["First", "Second", "AfterSecond"]);
}

#[test]
fn numeric_excel_serial_dates_are_read() {
    let raw = history_with_rows(&[("45352", "15:00", "Serial")]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.csv");
    fs::write(&path, raw).unwrap();
    let (records, _) = load_matches(&path, TableKind::Historical).unwrap();
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 1));
}
