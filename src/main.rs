use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use oddslab::config::{self, AppConfig};
use oddslab::dashboard;
use oddslab::export;
use oddslab::features;
use oddslab::loader::{self, TableKind};
use oddslab::report;
use oddslab::session::{Session, SessionInput};
use oddslab::strategy::StrategyBank;

const DETAIL_ROWS: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "oddslab", version, about = "Backtest odds-based betting strategies and filter daily fixtures")]
struct Cli {
    /// TOML configuration (leagues, pages, approval thresholds)
    #[arg(long, global = true, env = "ODDSLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Strategy bank CSV replacing the built-in one
    #[arg(long, global = true, env = "ODDSLAB_STRATEGIES")]
    strategies: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backtest every strategy against historical results
    Backtest(BacktestArgs),
    /// Backtest, then list today's fixtures matched by approved strategies
    Daily(DailyArgs),
    /// Interactive terminal view of a backtest and its picks
    Dashboard(DashboardArgs),
    /// Print the derived features of one row of a file
    Features(FeaturesArgs),
}

#[derive(Args, Debug)]
struct BacktestArgs {
    #[arg(long)]
    history: PathBuf,
    /// Only evaluate strategies on this page
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    approved_only: bool,
    #[arg(long)]
    json: bool,
    /// Write Summary and Ledger sheets to this workbook
    #[arg(long)]
    export: Option<PathBuf>,
    /// Show the latest matched games of one strategy
    #[arg(long)]
    detail: Option<String>,
}

#[derive(Args, Debug)]
struct DailyArgs {
    #[arg(long)]
    history: PathBuf,
    #[arg(long)]
    fixtures: PathBuf,
    /// Keep only fixtures on this date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    #[arg(long)]
    history: PathBuf,
    #[arg(long)]
    fixtures: Option<PathBuf>,
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct FeaturesArgs {
    #[arg(long)]
    input: PathBuf,
    /// Zero-based data row
    #[arg(long, default_value_t = 0)]
    row: usize,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref()).context("load configuration")?;
    let config = config::install(config);
    config.init_logging(matches!(cli.command, Command::Dashboard(_)));

    let bank = load_bank(cli.strategies.as_deref())?;
    match cli.command {
        Command::Backtest(args) => run_backtest(config, bank, args),
        Command::Daily(args) => run_daily(config, bank, args),
        Command::Dashboard(args) => run_dashboard(config, bank, args),
        Command::Features(args) => run_features(args),
    }
}

fn load_bank(path: Option<&Path>) -> Result<StrategyBank> {
    match path {
        Some(path) => StrategyBank::load(path)
            .with_context(|| format!("load strategies {}", path.display())),
        None => StrategyBank::bundled().context("load built-in strategies"),
    }
}

fn run_backtest(config: &AppConfig, bank: StrategyBank, args: BacktestArgs) -> Result<()> {
    let input = SessionInput {
        history: args.history.clone(),
        page: args.page.clone(),
        ..SessionInput::default()
    };
    let session = Session::run(config, bank, &input)
        .with_context(|| format!("backtest {}", args.history.display()))?;
    let report = &session.report;

    if let Some(path) = args.export.as_deref() {
        let summary = export::export_xlsx(path, report, None)?;
        eprintln!(
            "Exported {} strategies and {} ledger rows to {}",
            summary.strategies,
            summary.ledger_rows,
            path.display()
        );
    }

    if args.json {
        let out = if args.approved_only {
            let mut filtered = report.without_ledgers();
            filtered.results.retain(|r| r.approved);
            filtered
        } else {
            report.without_ledgers()
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_warnings(&session.log);
    println!("{}", report::page_table(report));
    println!("{}", report::summary_table(report, args.approved_only));

    if let Some(name) = args.detail.as_deref() {
        let Some(result) = report.find_strategy(name) else {
            bail!("no strategy named {name:?}");
        };
        if let Some(rule) = session.bank.get(&result.page, &result.strategy) {
            println!("{}", rule.describe());
        }
        println!("{}", report::detail_table(result, DETAIL_ROWS));
    }
    Ok(())
}

fn run_daily(config: &AppConfig, bank: StrategyBank, args: DailyArgs) -> Result<()> {
    let input = SessionInput {
        history: args.history.clone(),
        fixtures: Some(args.fixtures.clone()),
        date: args.date,
        page: args.page.clone(),
    };
    let session = Session::run(config, bank, &input)
        .with_context(|| format!("backtest {}", args.history.display()))?;
    let report = &session.report;

    if let Some(path) = args.export.as_deref() {
        let summary = export::export_xlsx(path, report, session.picks.as_ref())?;
        eprintln!(
            "Exported {} strategies and {} picks to {}",
            summary.strategies,
            summary.picks,
            path.display()
        );
    }

    if args.json {
        let approved: Vec<_> = report
            .without_ledgers()
            .results
            .into_iter()
            .filter(|r| r.approved)
            .collect();
        let out = json!({
            "history_rows": report.history_rows,
            "approved": approved,
            "picks": session.picks,
            "warnings": session.log,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_warnings(&session.log);
    println!("{}", report::summary_table(report, true));
    match session.picks.as_ref() {
        Some(picks) => println!("{}", report::picks_table(picks)),
        None => println!("Daily filter skipped, see warnings above"),
    }
    Ok(())
}

fn run_dashboard(config: &AppConfig, bank: StrategyBank, args: DashboardArgs) -> Result<()> {
    let input = SessionInput {
        history: args.history.clone(),
        fixtures: args.fixtures.clone(),
        date: args.date,
        page: None,
    };
    let session = Session::run(config, bank, &input)
        .with_context(|| format!("backtest {}", args.history.display()))?;
    dashboard::run(session).context("dashboard terminal")?;
    Ok(())
}

fn run_features(args: FeaturesArgs) -> Result<()> {
    let table = loader::load_table(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let (records, features, load) = features::derive_from_table(&table, TableKind::Fixtures)?;
    print_warnings(&load.warnings());
    let Some(record) = records.get(args.row) else {
        bail!(
            "row {} out of range ({} usable rows in {})",
            args.row,
            records.len(),
            args.input.display()
        );
    };
    print!("{}", report::feature_dump(record, &features, args.row));
    Ok(())
}

fn print_warnings(lines: &[String]) {
    for line in lines {
        eprintln!("{line}");
    }
}
