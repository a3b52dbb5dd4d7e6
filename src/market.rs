use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    BackHome,
    BackDraw,
    BackAway,
    BackOver25,
    BackUnder25,
    BackBttsYes,
    BackBttsNo,
    LayCs0x0,
    LayCs0x1,
    LayCs1x0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Back,
    Lay,
}

impl Market {
    pub const ALL: [Market; 10] = [
        Market::BackHome,
        Market::BackDraw,
        Market::BackAway,
        Market::BackOver25,
        Market::BackUnder25,
        Market::BackBttsYes,
        Market::BackBttsNo,
        Market::LayCs0x0,
        Market::LayCs0x1,
        Market::LayCs1x0,
    ];

    /// Index into `Odds::values`; matches the order of `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn odds_column(self) -> &'static str {
        match self {
            Market::BackHome => "Odd_H_Back",
            Market::BackDraw => "Odd_D_Back",
            Market::BackAway => "Odd_A_Back",
            Market::BackOver25 => "Odd_Over25_FT_Back",
            Market::BackUnder25 => "Odd_Under25_FT_Back",
            Market::BackBttsYes => "Odd_BTTS_Yes_Back",
            Market::BackBttsNo => "Odd_BTTS_No_Back",
            Market::LayCs0x0 => "Odd_CS_0x0_Lay",
            Market::LayCs0x1 => "Odd_CS_0x1_Lay",
            Market::LayCs1x0 => "Odd_CS_1x0_Lay",
        }
    }

    /// Name of the implied-probability feature derived from this market.
    pub fn probability_name(self) -> &'static str {
        match self {
            Market::BackHome => "pH",
            Market::BackDraw => "pD",
            Market::BackAway => "pA",
            Market::BackOver25 => "pOver",
            Market::BackUnder25 => "pUnder",
            Market::BackBttsYes => "pBTTS_Y",
            Market::BackBttsNo => "pBTTS_N",
            Market::LayCs0x0 => "p0x0",
            Market::LayCs0x1 => "p0x1",
            Market::LayCs1x0 => "p1x0",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Market::BackHome => "Back Home",
            Market::BackDraw => "Back Draw",
            Market::BackAway => "Back Away",
            Market::BackOver25 => "Back Over 2.5",
            Market::BackUnder25 => "Back Under 2.5",
            Market::BackBttsYes => "Back BTTS Yes",
            Market::BackBttsNo => "Back BTTS No",
            Market::LayCs0x0 => "Lay 0x0",
            Market::LayCs0x1 => "Lay 0x1",
            Market::LayCs1x0 => "Lay 1x0",
        }
    }

    pub fn side(self) -> Side {
        match self {
            Market::LayCs0x0 | Market::LayCs0x1 | Market::LayCs1x0 => Side::Lay,
            _ => Side::Back,
        }
    }

    /// Whether the bet this market implies wins for the given final score.
    pub fn outcome_hit(self, goals_h: u32, goals_a: u32) -> bool {
        let total = goals_h + goals_a;
        match self {
            Market::BackHome => goals_h > goals_a,
            Market::BackDraw => goals_h == goals_a,
            Market::BackAway => goals_h < goals_a,
            Market::BackOver25 => total >= 3,
            Market::BackUnder25 => total <= 2,
            Market::BackBttsYes => goals_h > 0 && goals_a > 0,
            Market::BackBttsNo => goals_h == 0 || goals_a == 0,
            Market::LayCs0x0 => (goals_h, goals_a) != (0, 0),
            Market::LayCs0x1 => (goals_h, goals_a) != (0, 1),
            Market::LayCs1x0 => (goals_h, goals_a) != (1, 0),
        }
    }

    /// Stake-1 settlement. Commission is taken from winnings only.
    ///
    /// Back: win pays `odds - 1`, loss costs the stake.
    /// Lay: the backer's stake of 1 is won, a loss costs the liability `odds - 1`.
    pub fn settle(self, odds: f64, hit: bool, commission: f64) -> f64 {
        let keep = 1.0 - commission;
        match (self.side(), hit) {
            (Side::Back, true) => (odds - 1.0) * keep,
            (Side::Back, false) => -1.0,
            (Side::Lay, true) => keep,
            (Side::Lay, false) => -(odds - 1.0),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Market {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-', '.'], "_");
        let market = match key.as_str() {
            "back_home" | "home" => Market::BackHome,
            "back_draw" | "draw" => Market::BackDraw,
            "back_away" | "away" => Market::BackAway,
            "back_over25" | "back_over_2_5" | "over25" => Market::BackOver25,
            "back_under25" | "back_under_2_5" | "under25" => Market::BackUnder25,
            "back_btts_yes" | "btts_yes" => Market::BackBttsYes,
            "back_btts_no" | "btts_no" => Market::BackBttsNo,
            "lay_cs_0x0" | "lay_cs0x0" | "lay_0x0" => Market::LayCs0x0,
            "lay_cs_0x1" | "lay_cs0x1" | "lay_0x1" => Market::LayCs0x1,
            "lay_cs_1x0" | "lay_cs1x0" | "lay_1x0" => Market::LayCs1x0,
            _ => return Err(LabError::UnknownMarket(s.to_string())),
        };
        Ok(market)
    }
}
