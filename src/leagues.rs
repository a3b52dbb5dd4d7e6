use std::collections::HashSet;

use tracing::info;

use crate::config::AppConfig;
use crate::record::MatchRecord;

/// Set-membership filter over the `League` column.
#[derive(Debug, Clone, Default)]
pub struct LeagueFilter {
    allowed: HashSet<String>,
}

impl LeagueFilter {
    pub fn new<I, S>(leagues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = leagues
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.leagues)
    }

    pub fn allows_all(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn allows(&self, league: &str) -> bool {
        self.allows_all() || self.allowed.contains(league.trim())
    }

    pub fn retain(&self, records: Vec<MatchRecord>) -> Vec<MatchRecord> {
        let before = records.len();
        let kept = records
            .into_iter()
            .filter(|r| self.allows(&r.league))
            .collect::<Vec<_>>();
        if kept.len() < before {
            info!(
                dropped = before - kept.len(),
                kept = kept.len(),
                "league filter applied"
            );
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Odds;

    fn record(league: &str) -> MatchRecord {
        MatchRecord {
            league: league.to_string(),
            home: "A".to_string(),
            away: "B".to_string(),
            time: "15:00".to_string(),
            date: None,
            odds: Odds { values: [2.0; 10] },
            goals_h: None,
            goals_a: None,
        }
    }

    #[test]
    fn keeps_only_allowed_leagues() {
        let filter = LeagueFilter::new(["ENGLAND - PREMIER LEAGUE", " ITALY - SERIE A "]);
        let kept = filter.retain(vec![
            record("ENGLAND - PREMIER LEAGUE"),
            record("SCOTLAND - PREMIERSHIP"),
            record("ITALY - SERIE A"),
        ]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.league != "SCOTLAND - PREMIERSHIP"));
    }

    #[test]
    fn empty_allow_list_passes_everything() {
        let filter = LeagueFilter::new(Vec::<String>::new());
        assert!(filter.allows_all());
        assert_eq!(filter.retain(vec![record("X"), record("Y")]).len(), 2);
    }
}
