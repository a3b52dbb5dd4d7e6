//! Seeded synthetic match data: Poisson scorelines priced into the ten
//! markets with a bookmaker margin. Used by benches, tests and `synth_matches`.

use std::io::Write;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::market::{Market, Side};
use crate::record::{MatchRecord, Odds};

const MAX_GOALS: usize = 10;
const LEAGUES: &[&str] = &[
    "ENGLAND - PREMIER LEAGUE",
    "SPAIN - LALIGA",
    "ITALY - SERIE A",
    "GERMANY - BUNDESLIGA",
    "BRAZIL - SERIE A",
];
const KICKOFFS: &[&str] = &["13:30", "15:00", "17:30", "20:00"];

fn poisson_pmf(lambda: f64) -> [f64; MAX_GOALS + 1] {
    let mut out = [0.0; MAX_GOALS + 1];
    let mut p = (-lambda).exp();
    for (k, slot) in out.iter_mut().enumerate() {
        if k > 0 {
            p *= lambda / k as f64;
        }
        *slot = p;
    }
    out
}

fn sample_poisson(rng: &mut StdRng, lambda: f64) -> u32 {
    // Knuth; lambdas here stay small.
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    loop {
        p *= rng.gen_range(0.0..1.0);
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

/// Fair probability of each market for independent Poisson goal counts.
pub fn market_probabilities(lambda_h: f64, lambda_a: f64) -> [f64; 10] {
    let ph = poisson_pmf(lambda_h);
    let pa = poisson_pmf(lambda_a);
    let mut out = [0.0; 10];
    for (h, p_h) in ph.iter().enumerate() {
        for (a, p_a) in pa.iter().enumerate() {
            let p = p_h * p_a;
            for market in Market::ALL {
                let hit = match market {
                    // Correct-score markets are priced on the score landing.
                    Market::LayCs0x0 => (h, a) == (0, 0),
                    Market::LayCs0x1 => (h, a) == (0, 1),
                    Market::LayCs1x0 => (h, a) == (1, 0),
                    other => other.outcome_hit(h as u32, a as u32),
                };
                if hit {
                    out[market.index()] += p;
                }
            }
        }
    }
    out
}

pub struct SyntheticMatches {
    rng: StdRng,
    start: NaiveDate,
    produced: usize,
}

impl SyntheticMatches {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            start: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap_or(NaiveDate::MIN),
            produced: 0,
        }
    }

    pub fn next_record(&mut self) -> MatchRecord {
        let rng = &mut self.rng;
        let lambda_h = rng.gen_range(0.7..2.3);
        let lambda_a = rng.gen_range(0.5..1.9);
        let margin = rng.gen_range(1.02..1.07);

        let probs = market_probabilities(lambda_h, lambda_a);
        let mut values = [0.0; 10];
        for market in Market::ALL {
            let p = probs[market.index()].max(1e-4);
            let price = match market.side() {
                Side::Back => 1.0 / (p * margin),
                // Lay prices sit slightly above the fair price of the score.
                Side::Lay => 1.0 / p * 1.02,
            };
            values[market.index()] = (price.max(1.01) * 100.0).round() / 100.0;
        }

        let goals_h = sample_poisson(rng, lambda_h);
        let goals_a = sample_poisson(rng, lambda_a);
        let league = LEAGUES[rng.gen_range(0..LEAGUES.len())];
        let time = KICKOFFS[rng.gen_range(0..KICKOFFS.len())];
        let idx = self.produced;
        self.produced += 1;

        MatchRecord {
            league: league.to_string(),
            home: format!("Home {:04}", idx),
            away: format!("Away {:04}", idx),
            time: time.to_string(),
            date: Some(self.start + Duration::days((idx / 12) as i64)),
            odds: Odds { values },
            goals_h: Some(goals_h),
            goals_a: Some(goals_a),
        }
    }

    pub fn take(&mut self, n: usize) -> Vec<MatchRecord> {
        (0..n).map(|_| self.next_record()).collect()
    }
}

pub fn generate(seed: u64, n: usize) -> Vec<MatchRecord> {
    SyntheticMatches::new(seed).take(n)
}

/// Writes records in the loader's CSV layout. Goals are left blank when
/// `with_results` is false, producing a fixtures file.
pub fn write_csv<W: Write>(out: W, records: &[MatchRecord], with_results: bool) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec!["Date", "League", "Time", "Home", "Away"];
    if with_results {
        header.extend(["Goals_H", "Goals_A"]);
    }
    header.extend(Market::ALL.iter().map(|m| m.odds_column()));
    writer.write_record(&header)?;

    for r in records {
        let mut row = vec![
            r.date.map(|d| d.to_string()).unwrap_or_default(),
            r.league.clone(),
            r.time.clone(),
            r.home.clone(),
            r.away.clone(),
        ];
        if with_results {
            row.push(r.goals_h.map(|g| g.to_string()).unwrap_or_default());
            row.push(r.goals_a.map(|g| g.to_string()).unwrap_or_default());
        }
        row.extend(r.odds.values.iter().map(|v| format!("{v:.2}")));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
