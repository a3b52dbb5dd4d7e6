use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;

use oddslab::synthetic::{SyntheticMatches, write_csv};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let rows = args
        .next()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(5_000);
    let seed = std::env::var("SYNTH_SEED")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(42);

    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let mut generator = SyntheticMatches::new(seed);
    let history = generator.take(rows);
    let next_day = history
        .last()
        .and_then(|r| r.date)
        .map(|d| d + Duration::days(1));

    // One matchday of fixtures: no scores, all on the day after the history.
    let fixtures: Vec<_> = generator
        .take(30)
        .into_iter()
        .map(|mut r| {
            r.date = next_day;
            r.goals_h = None;
            r.goals_a = None;
            r
        })
        .collect();

    let history_path = out_dir.join("history.csv");
    let file = File::create(&history_path)
        .with_context(|| format!("create {}", history_path.display()))?;
    write_csv(BufWriter::new(file), &history, true)?;

    let fixtures_path = out_dir.join("fixtures.csv");
    let file = File::create(&fixtures_path)
        .with_context(|| format!("create {}", fixtures_path.display()))?;
    write_csv(BufWriter::new(file), &fixtures, false)?;

    println!("History: {} rows -> {}", history.len(), history_path.display());
    println!("Fixtures: {} rows -> {}", fixtures.len(), fixtures_path.display());
    if let Some(day) = next_day {
        println!("Fixture date: {day}");
    }
    Ok(())
}
