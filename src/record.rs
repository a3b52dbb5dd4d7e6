use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::market::Market;

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H.%M"];

/// Decimal odds for the ten markets, indexed by `Market::index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub values: [f64; 10],
}

impl Odds {
    pub fn get(&self, market: Market) -> f64 {
        self.values[market.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub league: String,
    pub home: String,
    pub away: String,
    pub time: String,
    pub date: Option<NaiveDate>,
    pub odds: Odds,
    pub goals_h: Option<u32>,
    pub goals_a: Option<u32>,
}

impl MatchRecord {
    pub fn result(&self) -> Option<(u32, u32)> {
        match (self.goals_h, self.goals_a) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }

    /// Identity used to deduplicate fixtures across strategies.
    pub fn fixture_key(&self) -> (&str, &str, &str) {
        (&self.league, &self.home, &self.away)
    }

    /// Kickoff parsed from `time`; `None` when the text is not a clock time.
    pub fn kickoff(&self) -> Option<NaiveTime> {
        let raw = self.time.trim();
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
    }

    pub fn fixture_label(&self) -> String {
        format!("{} v {}", self.home, self.away)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: &str) -> MatchRecord {
        MatchRecord {
            league: "L".to_string(),
            home: "A".to_string(),
            away: "B".to_string(),
            time: time.to_string(),
            date: None,
            odds: Odds { values: [2.0; 10] },
            goals_h: None,
            goals_a: None,
        }
    }

    #[test]
    fn kickoff_orders_single_digit_hours() {
        assert_eq!(at("9:30").kickoff(), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(at("15:00:00").kickoff(), NaiveTime::from_hms_opt(15, 0, 0));
        assert!(at("9:30").kickoff() < at("15:00").kickoff());
        assert_eq!(at("TBD").kickoff(), None);
    }
}
