pub mod backtest;
pub mod config;
pub mod daily;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod features;
pub mod leagues;
pub mod loader;
pub mod market;
pub mod record;
pub mod report;
pub mod session;
pub mod strategy;
pub mod synthetic;

pub use error::{LabError, Result};
