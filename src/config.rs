use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{LabError, Result};
use crate::market::Market;

pub const CONFIG_ENV: &str = "ODDSLAB_CONFIG";

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Allowed values of the `League` column. Empty allows every league.
    #[serde(default)]
    pub leagues: Vec<String>,
    /// Exchange commission taken from winnings, as a fraction.
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub windows: Windows,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Windows {
    pub short: usize,
    pub long: usize,
}

impl Default for Windows {
    fn default() -> Self {
        Self { short: 8, long: 40 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// One strategy page: every rule on it bets the same market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub name: String,
    pub market: Market,
    #[serde(default)]
    pub min_odds: Option<f64>,
    #[serde(default)]
    pub max_odds: Option<f64>,
    #[serde(default)]
    pub approval: ApprovalCriteria,
}

impl PageConfig {
    pub fn odds_in_range(&self, odds: f64) -> bool {
        self.min_odds.is_none_or(|min| odds >= min) && self.max_odds.is_none_or(|max| odds <= max)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalCriteria {
    pub min_profit_short: f64,
    pub min_profit_long: f64,
    pub min_hit_rate_short: f64,
    pub min_hit_rate_long: f64,
    pub min_games: usize,
}

impl Default for ApprovalCriteria {
    fn default() -> Self {
        Self {
            min_profit_short: 0.1,
            min_profit_long: 0.1,
            min_hit_rate_short: 0.5,
            min_hit_rate_long: 0.5,
            min_games: 0,
        }
    }
}

impl AppConfig {
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| LabError::io(path, err))?;
        Self::from_toml_str(&raw)
    }

    /// Explicit path, then `ODDSLAB_CONFIG`, then the bundled defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load(&path),
            None => Self::bundled(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.windows.short == 0 || self.windows.long == 0 {
            return Err(LabError::Config("windows must be non-zero".to_string()));
        }
        if self.windows.short > self.windows.long {
            return Err(LabError::Config(format!(
                "short window ({}) exceeds long window ({})",
                self.windows.short, self.windows.long
            )));
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(LabError::Config(format!(
                "commission must be in [0, 1), got {}",
                self.commission
            )));
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.name.as_str()) {
                return Err(LabError::Config(format!("duplicate page {:?}", page.name)));
            }
            if let (Some(min), Some(max)) = (page.min_odds, page.max_odds) {
                if min > max {
                    return Err(LabError::Config(format!(
                        "page {:?}: min_odds {min} > max_odds {max}",
                        page.name
                    )));
                }
            }
            let a = &page.approval;
            let thresholds = [
                a.min_profit_short,
                a.min_profit_long,
                a.min_hit_rate_short,
                a.min_hit_rate_long,
            ];
            if thresholds.iter().any(|t| !t.is_finite()) {
                return Err(LabError::Config(format!(
                    "page {:?}: approval thresholds must be finite",
                    page.name
                )));
            }
        }
        Ok(())
    }

    pub fn page(&self, name: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn init_logging(&self, quiet: bool) {
        let filter = if quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.logging.level))
        };

        let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
        let _ = match self.logging.format.as_str() {
            "json" => builder.json().try_init(),
            _ => builder.try_init(),
        };
    }
}

/// Installs the process-wide configuration. The first call wins; later calls
/// return the already-installed value.
pub fn install(config: AppConfig) -> &'static AppConfig {
    CONFIG.get_or_init(|| config)
}
