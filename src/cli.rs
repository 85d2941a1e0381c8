//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapters::csv_adapter::{CsvAdapter, format_timestamp};
use crate::adapters::csv_report_adapter::{CsvReportAdapter, report_paths};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, parse_value, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::NlmaError;
use crate::domain::ohlcv::PriceSource;
use crate::domain::signal::SignalMode;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "nlmatrader", about = "NonLagMA crossover backtester")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Show data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level);

    match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                exit_with(run_backtest(
                    &config,
                    symbol.as_deref(),
                    data_dir.as_deref(),
                    output.as_deref(),
                ))
            }
        }
        Command::Validate { config } => exit_with(run_validate(&config)),
        Command::ListSymbols { config, data_dir } => {
            exit_with(run_list_symbols(&config, data_dir.as_deref()))
        }
        Command::Info {
            config,
            symbol,
            data_dir,
        } => exit_with(run_info(&config, symbol.as_deref(), data_dir.as_deref())),
    }
}

/// Install the stderr subscriber. A second call is a no-op.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn exit_with(result: Result<(), NlmaError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, NlmaError> {
    FileConfigAdapter::from_file(path)
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    data_dir_override: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), NlmaError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let symbol = resolve_symbol(symbol_override, &adapter)?;
    let data_dir = resolve_data_dir(data_dir_override, &adapter)?;
    let (start, end) = resolve_date_range(&adapter)?;
    let output = output_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from));

    eprintln!("Loading strategy: {}", strategy.name);
    let data_port = CsvAdapter::new(data_dir);

    run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter,
        &strategy,
        &bt_config,
        &symbol,
        (start, end),
        output.as_deref(),
    )
    .map(|_| ())
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, NlmaError> {
    validate_backtest_config(adapter)?;
    let defaults = BacktestConfig::default();

    Ok(BacktestConfig {
        initial_capital: parse_value(adapter, "backtest", "initial_capital")?
            .unwrap_or(defaults.initial_capital),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, NlmaError> {
    validate_strategy_config(adapter)?;
    let defaults = Strategy::default();

    let name = adapter
        .get_string("strategy", "name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or(defaults.name);

    Ok(Strategy {
        name,
        period: parse_value::<usize>(adapter, "strategy", "period")?.unwrap_or(defaults.period),
        price_source: parse_value::<PriceSource>(adapter, "strategy", "price_source")?
            .unwrap_or(defaults.price_source),
        std_threshold: parse_value(adapter, "strategy", "std_threshold")?
            .unwrap_or(defaults.std_threshold),
        filter_strength: parse_value(adapter, "strategy", "filter_strength")?
            .unwrap_or(defaults.filter_strength),
        enable_std_filter: adapter.get_bool(
            "strategy",
            "enable_std_filter",
            defaults.enable_std_filter,
        ),
        enable_clutter_filter: adapter.get_bool(
            "strategy",
            "enable_clutter_filter",
            defaults.enable_clutter_filter,
        ),
        signal_mode: parse_value::<SignalMode>(adapter, "strategy", "signal_mode")?
            .unwrap_or(defaults.signal_mode),
        heikin_ashi: adapter.get_bool("strategy", "heikin_ashi", defaults.heikin_ashi),
    })
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, NlmaError> {
    match symbol_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(symbol) => Ok(symbol.to_string()),
        None => config.require_string("backtest", "symbol"),
    }
}

pub fn resolve_data_dir(
    dir_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, NlmaError> {
    match dir_override {
        Some(dir) => Ok(dir.to_path_buf()),
        None => config.require_string("data", "dir").map(PathBuf::from),
    }
}

pub fn resolve_date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), NlmaError> {
    Ok((
        parse_date(config, "backtest", "start_date")?,
        parse_date(config, "backtest", "end_date")?,
    ))
}

/// Fetch, run, summarise and optionally write the report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    symbol: &str,
    (start, end): (Option<NaiveDate>, Option<NaiveDate>),
    output_path: Option<&Path>,
) -> Result<BacktestResult, NlmaError> {
    let bars = data_port.fetch_bars(symbol, start, end)?;
    eprintln!("Loaded {} bars for {}", bars.len(), symbol);

    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        eprintln!(
            "Running backtest: {} to {}",
            format_timestamp(&first.timestamp),
            format_timestamp(&last.timestamp)
        );
    }

    let result = backtest_engine::run_backtest(&bars, strategy, bt_config)?;
    print_summary(symbol, strategy, &result);

    if let Some(output) = output_path {
        report_port.write(&result, strategy, output)?;
        let (bars_path, trades_path, summary_path) = report_paths(output);
        eprintln!("\nReport written to:");
        eprintln!("  {}", bars_path.display());
        eprintln!("  {}", trades_path.display());
        eprintln!("  {}", summary_path.display());
    }

    Ok(result)
}

fn print_summary(symbol: &str, strategy: &Strategy, result: &BacktestResult) {
    let s = &result.summary;
    eprintln!("\n=== {} on {} ===", strategy.name, symbol);
    eprintln!("Initial Capital:  {:.2}", result.simulation.initial_capital);
    eprintln!("Final Equity:     {:.2}", s.final_equity);
    eprintln!("Profit:           {:.2}", s.profit);
    eprintln!("Total Return:     {:.2}%", s.cumulative_return * 100.0);
    eprintln!("Buy & Hold:       {:.2}%", s.buy_hold_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", s.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", s.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", s.total_trades);
    eprintln!(
        "Signals:          {} buy, {} sell",
        result.signal_counts.buys, result.signal_counts.sells
    );
}

fn print_strategy(strategy: &Strategy) {
    eprintln!("\nStrategy: {}", strategy.name);
    eprintln!("  period:                {}", strategy.period);
    eprintln!("  price_source:          {}", strategy.price_source);
    eprintln!("  std_threshold:         {}", strategy.std_threshold);
    eprintln!("  filter_strength:       {}", strategy.filter_strength);
    eprintln!("  enable_std_filter:     {}", strategy.enable_std_filter);
    eprintln!("  enable_clutter_filter: {}", strategy.enable_clutter_filter);
    eprintln!("  signal_mode:           {}", strategy.signal_mode);
    eprintln!("  heikin_ashi:           {}", strategy.heikin_ashi);
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    exit_with(dry_run(config_path))
}

fn dry_run(config_path: &Path) -> Result<(), NlmaError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let symbol = resolve_symbol(None, &adapter)?;
    let data_dir = resolve_data_dir(None, &adapter)?;
    let (start, end) = resolve_date_range(&adapter)?;
    eprintln!("Config validated successfully");

    print_strategy(&strategy);
    eprintln!("\nBacktest:");
    eprintln!("  symbol:          {}", symbol);
    eprintln!("  data:            {}", data_dir.join(format!("{symbol}.csv")).display());
    eprintln!("  initial_capital: {:.2}", bt_config.initial_capital);
    eprintln!(
        "  range:           {} to {}",
        start.map(|d| d.to_string()).unwrap_or_else(|| "start".into()),
        end.map(|d| d.to_string()).unwrap_or_else(|| "end".into())
    );

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), NlmaError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;

    build_backtest_config(&adapter)?;
    let strategy = build_strategy(&adapter)?;
    print_strategy(&strategy);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: &Path, data_dir: Option<&Path>) -> Result<(), NlmaError> {
    let config = load_config(config_path)?;
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, &config)?);

    let symbols = adapter.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_info(
    config_path: &Path,
    symbol: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<(), NlmaError> {
    let config = load_config(config_path)?;
    let symbol = resolve_symbol(symbol, &config)?;
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, &config)?);

    match adapter.get_data_range(&symbol)? {
        Some((first, last, count)) => println!(
            "{}: {} bars, {} to {}",
            symbol,
            count,
            format_timestamp(&first),
            format_timestamp(&last)
        ),
        None => eprintln!("{}: no data found", symbol),
    }
    Ok(())
}
