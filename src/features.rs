//! Implied probabilities and the 77 derived ratio/difference/angle/dispersion
//! features used by the strategy rules.
//!
//! The `VARnn` keys are fixed: rule thresholds were tuned against exactly this
//! pairing and operand order, so entries must never be reordered or swapped.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::error::Result;
use crate::loader::{self, LoadReport, RawTable, TableKind};
use crate::market::Market;
use crate::record::{MatchRecord, Odds};

const H: Market = Market::BackHome;
const D: Market = Market::BackDraw;
const A: Market = Market::BackAway;
const OVER: Market = Market::BackOver25;
const UNDER: Market = Market::BackUnder25;
const BTTS_Y: Market = Market::BackBttsYes;
const BTTS_N: Market = Market::BackBttsNo;
const CS00: Market = Market::LayCs0x0;
const CS01: Market = Market::LayCs0x1;
const CS10: Market = Market::LayCs1x0;

const GROUP_1X2: &[Market] = &[H, D, A];
const GROUP_GOALS: &[Market] = &[OVER, UNDER];
const GROUP_BTTS: &[Market] = &[BTTS_Y, BTTS_N];
const GROUP_CS: &[Market] = &[CS00, CS01, CS10];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    /// `a / b`
    Ratio(Market, Market),
    /// `|a - b|`
    AbsDiff(Market, Market),
    /// `atan((b - a) / 2)` in degrees
    Angle(Market, Market),
    /// `|a - b| / b`
    RelDiff(Market, Market),
    /// Sample standard deviation over mean.
    Dispersion(&'static [Market]),
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureDef {
    pub key: &'static str,
    pub formula: Formula,
}

const fn def(key: &'static str, formula: Formula) -> FeatureDef {
    FeatureDef { key, formula }
}

use Formula::{AbsDiff, Angle, Dispersion, Ratio, RelDiff};

pub static FEATURE_DEFS: [FeatureDef; 77] = [
    def("VAR01", Ratio(H, A)),
    def("VAR02", Ratio(A, H)),
    def("VAR03", Ratio(D, H)),
    def("VAR04", Ratio(H, D)),
    def("VAR05", Ratio(D, A)),
    def("VAR06", Ratio(A, D)),
    def("VAR07", Ratio(OVER, UNDER)),
    def("VAR08", Ratio(UNDER, OVER)),
    def("VAR09", Ratio(BTTS_Y, BTTS_N)),
    def("VAR10", Ratio(BTTS_N, BTTS_Y)),
    def("VAR11", Ratio(CS00, CS01)),
    def("VAR12", Ratio(CS01, CS00)),
    def("VAR13", Ratio(CS00, CS10)),
    def("VAR14", Ratio(CS10, CS00)),
    def("VAR15", Ratio(CS01, CS10)),
    def("VAR16", Ratio(CS10, CS01)),
    def("VAR17", Ratio(H, OVER)),
    def("VAR18", Ratio(OVER, H)),
    def("VAR19", Ratio(A, OVER)),
    def("VAR20", Ratio(OVER, A)),
    def("VAR21", Ratio(D, UNDER)),
    def("VAR22", Ratio(UNDER, D)),
    def("VAR23", Ratio(H, BTTS_Y)),
    def("VAR24", Ratio(BTTS_Y, H)),
    def("VAR25", Ratio(A, BTTS_Y)),
    def("VAR26", Ratio(BTTS_Y, A)),
    def("VAR27", Ratio(D, CS00)),
    def("VAR28", Ratio(CS00, D)),
    def("VAR29", Ratio(UNDER, CS00)),
    def("VAR30", Ratio(CS00, UNDER)),
    def("VAR31", Ratio(BTTS_N, CS00)),
    def("VAR32", Ratio(CS00, BTTS_N)),
    def("VAR33", Ratio(OVER, BTTS_Y)),
    def("VAR34", Ratio(BTTS_Y, OVER)),
    def("VAR35", AbsDiff(H, A)),
    def("VAR36", AbsDiff(H, D)),
    def("VAR37", AbsDiff(D, A)),
    def("VAR38", AbsDiff(OVER, UNDER)),
    def("VAR39", AbsDiff(BTTS_Y, BTTS_N)),
    def("VAR40", AbsDiff(CS00, CS01)),
    def("VAR41", AbsDiff(CS00, CS10)),
    def("VAR42", AbsDiff(CS01, CS10)),
    def("VAR43", AbsDiff(H, OVER)),
    def("VAR44", AbsDiff(A, OVER)),
    def("VAR45", AbsDiff(D, UNDER)),
    def("VAR46", AbsDiff(OVER, BTTS_Y)),
    def("VAR47", AbsDiff(UNDER, BTTS_N)),
    def("VAR48", Angle(H, A)),
    def("VAR49", Angle(H, D)),
    def("VAR50", Angle(D, A)),
    def("VAR51", Angle(OVER, UNDER)),
    def("VAR52", Angle(BTTS_Y, BTTS_N)),
    def("VAR53", Angle(CS00, CS01)),
    def("VAR54", Angle(CS00, CS10)),
    def("VAR55", Angle(CS01, CS10)),
    def("VAR56", Angle(H, OVER)),
    def("VAR57", Angle(A, OVER)),
    def("VAR58", Angle(D, UNDER)),
    def("VAR59", Angle(OVER, BTTS_Y)),
    def("VAR60", RelDiff(H, A)),
    def("VAR61", RelDiff(A, H)),
    def("VAR62", RelDiff(H, D)),
    def("VAR63", RelDiff(D, H)),
    def("VAR64", RelDiff(D, A)),
    def("VAR65", RelDiff(A, D)),
    def("VAR66", RelDiff(OVER, UNDER)),
    def("VAR67", RelDiff(UNDER, OVER)),
    def("VAR68", RelDiff(BTTS_Y, BTTS_N)),
    def("VAR69", RelDiff(BTTS_N, BTTS_Y)),
    def("VAR70", RelDiff(CS00, CS01)),
    def("VAR71", RelDiff(CS01, CS10)),
    def("VAR72", RelDiff(CS10, CS00)),
    def("VAR73", RelDiff(OVER, BTTS_Y)),
    def("VAR74", Dispersion(GROUP_1X2)),
    def("VAR75", Dispersion(GROUP_GOALS)),
    def("VAR76", Dispersion(GROUP_BTTS)),
    def("VAR77", Dispersion(GROUP_CS)),
];

impl Formula {
    pub fn eval(&self, p: &[f64; 10]) -> f64 {
        let at = |m: Market| p[m.index()];
        match *self {
            Ratio(a, b) => at(a) / at(b),
            AbsDiff(a, b) => (at(a) - at(b)).abs(),
            Angle(a, b) => ((at(b) - at(a)) / 2.0).atan() * 180.0 / PI,
            RelDiff(a, b) => (at(a) - at(b)).abs() / at(b),
            Dispersion(group) => coefficient_of_variation(group.iter().map(|m| at(*m))),
        }
    }
}

fn coefficient_of_variation(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count();
    if n < 2 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt() / mean
}

pub fn implied_probabilities(odds: &Odds) -> [f64; 10] {
    odds.values.map(|o| 1.0 / o)
}

pub fn derive_row(odds: &Odds) -> [f64; 77] {
    let p = implied_probabilities(odds);
    let mut out = [0.0; 77];
    for (slot, def) in out.iter_mut().zip(FEATURE_DEFS.iter()) {
        *slot = def.formula.eval(&p);
    }
    out
}

/// Every name a rule condition may reference: raw odds columns, implied
/// probabilities, then `VAR01..VAR77`.
pub fn feature_names() -> Vec<&'static str> {
    Market::ALL
        .iter()
        .map(|m| m.odds_column())
        .chain(Market::ALL.iter().map(|m| m.probability_name()))
        .chain(FEATURE_DEFS.iter().map(|d| d.key))
        .collect()
}

pub fn is_known_feature(name: &str) -> bool {
    feature_names().contains(&name)
}

/// Column-oriented feature values, one entry per record.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    len: usize,
    names: Vec<&'static str>,
    columns: Vec<Vec<f64>>,
    index: HashMap<&'static str, usize>,
}

impl FeatureTable {
    pub fn derive(records: &[MatchRecord]) -> Self {
        let names = feature_names();
        let mut columns = vec![Vec::with_capacity(records.len()); names.len()];

        for record in records {
            let probs = implied_probabilities(&record.odds);
            let derived = derive_row(&record.odds);
            let values = record.odds.values.iter().chain(&probs).chain(&derived);
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(*value);
            }
        }

        let index = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        Self {
            len: records.len(),
            names,
            columns,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    pub fn value(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|c| c.get(row).copied())
    }

    pub fn row(&self, row: usize) -> Vec<(&'static str, f64)> {
        if row >= self.len {
            return Vec::new();
        }
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| (*name, column[row]))
            .collect()
    }
}

/// Parse and derive in one step. Any missing odds column fails the whole
/// derivation; nothing is derived for a partial table.
pub fn derive_from_table(
    table: &RawTable,
    kind: TableKind,
) -> Result<(Vec<MatchRecord>, FeatureTable, LoadReport)> {
    let (records, report) = loader::parse_matches(table, kind)?;
    let features = FeatureTable::derive(&records);
    Ok((records, features, report))
}
