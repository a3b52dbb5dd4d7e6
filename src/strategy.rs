//! Declarative strategy bank: each rule is a conjunction of 1-3 inclusive range
//! conditions over named features, evaluated by one generic interpreter.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};
use crate::features::{self, FeatureTable};

pub const MAX_CONDITIONS: usize = 3;

const DEFAULT_BANK: &str = include_str!("../config/strategies.csv");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub feature: String,
    pub lower: f64,
    pub upper: f64,
}

impl Condition {
    pub fn new(feature: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            feature: feature.into(),
            lower,
            upper,
        }
    }

    /// Inclusive on both ends; NaN never holds.
    pub fn holds(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRule {
    pub page: String,
    pub name: String,
    pub conditions: Vec<Condition>,
}

impl StrategyRule {
    pub fn new(
        page: impl Into<String>,
        name: impl Into<String>,
        conditions: Vec<Condition>,
    ) -> Result<Self> {
        let rule = Self {
            page: page.into(),
            name: name.into(),
            conditions,
        };
        rule.validate()?;
        Ok(rule)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| LabError::InvalidRule {
            strategy: self.name.clone(),
            reason,
        };
        if self.conditions.is_empty() || self.conditions.len() > MAX_CONDITIONS {
            return Err(invalid(format!(
                "expected 1-{MAX_CONDITIONS} conditions, got {}",
                self.conditions.len()
            )));
        }
        for c in &self.conditions {
            if !features::is_known_feature(&c.feature) {
                return Err(LabError::UnknownFeature(c.feature.clone()));
            }
            if c.lower.is_nan() || c.upper.is_nan() || c.lower > c.upper {
                return Err(invalid(format!(
                    "{}: bounds [{}, {}] are not a range",
                    c.feature, c.lower, c.upper
                )));
            }
        }
        Ok(())
    }

    pub fn matches_row(&self, table: &FeatureTable, row: usize) -> bool {
        self.conditions.iter().all(|c| {
            table
                .value(&c.feature, row)
                .is_some_and(|value| c.holds(value))
        })
    }

    pub fn mask(&self, table: &FeatureTable) -> Vec<bool> {
        let mut mask = vec![true; table.len()];
        for c in &self.conditions {
            let Some(column) = table.column(&c.feature) else {
                mask.fill(false);
                break;
            };
            for (keep, value) in mask.iter_mut().zip(column) {
                *keep = *keep && c.holds(*value);
            }
        }
        mask
    }

    pub fn matched_rows(&self, table: &FeatureTable) -> Vec<usize> {
        self.mask(table)
            .into_iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect()
    }

    /// Rule made of the first `n` conditions.
    pub fn prefix(&self, n: usize) -> Self {
        Self {
            page: self.page.clone(),
            name: self.name.clone(),
            conditions: self.conditions.iter().take(n).cloned().collect(),
        }
    }

    pub fn describe(&self) -> String {
        self.conditions
            .iter()
            .map(|c| format!("{} in [{}, {}]", c.feature, c.lower, c.upper))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// A rule paired with the feature table it is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct BoundStrategy<'a> {
    pub rule: &'a StrategyRule,
    table: &'a FeatureTable,
}

impl<'a> BoundStrategy<'a> {
    pub fn bind(rule: &'a StrategyRule, table: &'a FeatureTable) -> Self {
        Self { rule, table }
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn matches(&self, row: usize) -> bool {
        self.rule.matches_row(self.table, row)
    }

    pub fn mask(&self) -> Vec<bool> {
        self.rule.mask(self.table)
    }
}

pub fn apply_strategies<'a>(
    bank: &'a StrategyBank,
    table: &'a FeatureTable,
) -> Vec<BoundStrategy<'a>> {
    bank.rules()
        .iter()
        .map(|rule| BoundStrategy::bind(rule, table))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct StrategyBank {
    rules: Vec<StrategyRule>,
}

#[derive(Debug, Deserialize)]
struct BankRow {
    page: String,
    strategy: String,
    feature: String,
    #[serde(default)]
    lower: String,
    #[serde(default)]
    upper: String,
}

impl StrategyBank {
    pub fn new(rules: Vec<StrategyRule>) -> Self {
        Self { rules }
    }

    pub fn bundled() -> Result<Self> {
        Self::from_csv_reader(DEFAULT_BANK.as_bytes())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).map_err(|err| LabError::io(path, err))?;
        Self::from_csv_reader(file)
    }

    /// Rows sharing `(page, strategy)` form one conjunction, in file order.
    /// Blank bounds are open-ended.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut order: Vec<(String, String)> = Vec::new();
        let mut grouped: HashMap<(String, String), Vec<Condition>> = HashMap::new();

        for (idx, row) in csv.deserialize::<BankRow>().enumerate() {
            let row = row?;
            let line = idx + 2;
            let lower = parse_bound(&row.lower, f64::NEG_INFINITY, line, "lower")?;
            let upper = parse_bound(&row.upper, f64::INFINITY, line, "upper")?;
            let key = (row.page, row.strategy);
            let conditions = grouped.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            conditions.push(Condition::new(row.feature, lower, upper));
        }

        let mut rules = Vec::with_capacity(order.len());
        for (page, name) in order {
            let conditions = grouped
                .remove(&(page.clone(), name.clone()))
                .unwrap_or_default();
            rules.push(StrategyRule::new(page, name, conditions)?);
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[StrategyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn pages(&self) -> Vec<&str> {
        let mut pages: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !pages.contains(&rule.page.as_str()) {
                pages.push(&rule.page);
            }
        }
        pages
    }

    pub fn page_rules<'a>(&'a self, page: &'a str) -> impl Iterator<Item = &'a StrategyRule> + 'a {
        self.rules.iter().filter(move |r| r.page == page)
    }

    pub fn get(&self, page: &str, name: &str) -> Option<&StrategyRule> {
        self.rules.iter().find(|r| r.page == page && r.name == name)
    }

    pub fn retain_page(&mut self, page: &str) {
        self.rules.retain(|r| r.page == page);
    }
}

fn parse_bound(raw: &str, open: f64, line: usize, column: &str) -> Result<f64> {
    if raw.is_empty() {
        return Ok(open);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| LabError::InvalidNumber {
            row: line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}
