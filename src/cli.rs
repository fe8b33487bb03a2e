//! CLI definition and dispatch.

use chrono::DateTime;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{resolve_strategy_name, validate_strategy_name};
use crate::domain::error::ProbtraderError;
use crate::domain::events::TracingSink;
use crate::domain::metrics::{Metrics, TokenResult};
use crate::domain::params::{PARAMS_SECTION, ParamMap};
use crate::domain::strategy::{STRATEGY_NAMES, build_strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "probtrader", about = "Strategy backtester for prediction-market tokens")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV of bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Overrides `[strategy] name` from the config
        #[arg(short, long)]
        strategy: Option<String>,
        /// INI file whose `[params]` section overrides strategy defaults
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// Build a strategy and show its resolved settings
    Validate {
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// List available strategies
    Strategies,
    /// Show tokens and date range of a bar file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            strategy,
            params,
        } => run_backtest(&config, &data, strategy.as_deref(), params.as_deref()),
        Command::Validate { strategy, params } => run_validate(&strategy, params.as_deref()),
        Command::Strategies => run_strategies(),
        Command::Info { data } => run_info(&data),
    }
}

fn fail(err: &ProbtraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ProbtraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| ProbtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Parameters from the run config's `[params]` section, overridden key by key
/// by the optional params file.
pub fn strategy_params(config: Option<&dyn ConfigPort>, params_path: Option<&Path>) -> ParamMap {
    let mut params = config
        .map(|c| ParamMap::from_config(c, PARAMS_SECTION))
        .unwrap_or_default();
    let overrides = FileConfigAdapter::load_params(params_path);
    for key in overrides.keys() {
        if let Some(value) = overrides.get(key) {
            params.insert(key, value);
        }
    }
    params
}

pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn run_backtest(
    config_path: &Path,
    data_path: &Path,
    strategy_override: Option<&str>,
    params_path: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let params = strategy_params(Some(&adapter), params_path);
    let data = CsvAdapter::new(data_path.to_path_buf());

    match run_backtest_pipeline(&adapter, &data, strategy_override, &params) {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Config validation, strategy construction, data load and replay.
pub fn run_backtest_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    strategy_override: Option<&str>,
    params: &ParamMap,
) -> Result<BacktestResult, ProbtraderError> {
    let bt_config = BacktestConfig::from_config(config)?;
    let name = resolve_strategy_name(Some(config), strategy_override)?;
    let mut strategy = build_strategy(&name, params)?;

    let bars = data.load_bars()?;
    if bars.is_empty() {
        return Err(ProbtraderError::NoData {
            reason: "data file has no bars".to_string(),
        });
    }
    eprintln!("Running backtest: {} with {} bars", name, bars.len());

    backtest_engine::run_backtest(bars, strategy.as_mut(), &bt_config, &mut TracingSink)
}

pub fn print_summary(result: &BacktestResult) {
    let metrics = Metrics::compute(&result.portfolio);
    let token_results = TokenResult::compute_per_token(&result.portfolio.closed_trades);

    eprintln!(
        "  Period: {} to {} ({} tokens, {} bars)",
        format_timestamp(result.first_timestamp),
        format_timestamp(result.last_timestamp),
        result.tokens.len(),
        result.bars_processed,
    );
    if result.ignored_bars > 0 {
        eprintln!("  Ignored: {} out-of-order bars", result.ignored_bars);
    }

    eprintln!("\n=== Aggregate Results ===");
    eprintln!("Strategy:         {}", result.strategy_name);
    eprintln!("Initial Capital:  {:.2}", result.portfolio.initial_capital);
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!(
        "Won / Lost:       {} / {}",
        metrics.trades_won, metrics.trades_lost
    );
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Avg Win:          {:.2}", metrics.avg_win);
    eprintln!("Avg Loss:         {:.2}", metrics.avg_loss);

    let open = result.portfolio.open_tokens();
    if !open.is_empty() {
        eprintln!("Open Positions:   {}", open.join(", "));
    }

    if !token_results.is_empty() {
        eprintln!("\n=== Per-Token Summary ===");
        for tr in &token_results {
            let pnl_sign = if tr.total_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} trades, {:.1}% win rate, {}{:.2}",
                tr.token_id,
                tr.total_trades,
                tr.win_rate * 100.0,
                pnl_sign,
                tr.total_pnl,
            );
        }
    }
}

fn run_validate(name: &str, params_path: Option<&Path>) -> ExitCode {
    eprintln!("Validating strategy: {name}");
    if let Err(e) = validate_strategy_name(name) {
        eprintln!("available: {}", STRATEGY_NAMES.join(", "));
        return fail(&e);
    }
    let params = strategy_params(None, params_path);
    let strategy = match build_strategy(name, &params) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let lifecycle = strategy.lifecycle();
    let rules = &lifecycle.rules;
    let indicators: Vec<String> = strategy.indicators().iter().map(|i| i.to_string()).collect();
    let optional = |v: Option<f64>| v.map_or_else(|| "off".to_string(), |p| format!("{:.1}%", p * 100.0));

    eprintln!("\nIndicators:     {}", indicators.join(", "));
    eprintln!("Risk Per Trade: {:.1}%", lifecycle.risk_percent * 100.0);
    eprintln!("Stop Loss:      {:.1}%", rules.stop_loss_pct * 100.0);
    eprintln!("Trailing Stop:  {}", optional(rules.trailing_stop_pct));
    eprintln!("Take Profit:    {}", optional(rules.take_profit_pct));
    eprintln!(
        "Max Hold:       {}",
        rules
            .max_hold_bars
            .map_or_else(|| "off".to_string(), |b| format!("{b} bars"))
    );
    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}

fn run_strategies() -> ExitCode {
    for name in STRATEGY_NAMES {
        println!("{name}");
    }
    ExitCode::SUCCESS
}

fn run_info(data_path: &Path) -> ExitCode {
    let data = CsvAdapter::new(data_path.to_path_buf());
    let bars = match data.load_bars() {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return fail(&ProbtraderError::NoData {
            reason: format!("{} has no bars", data_path.display()),
        });
    };

    eprintln!("Data file: {}", data_path.display());
    eprintln!(
        "  Range: {} to {}",
        format_timestamp(first.timestamp),
        format_timestamp(last.timestamp)
    );
    eprintln!("  Bars:  {}", bars.len());

    let mut tokens: BTreeMap<&str, usize> = BTreeMap::new();
    for bar in &bars {
        *tokens.entry(bar.token_id.as_str()).or_default() += 1;
    }
    eprintln!("  Tokens: {}", tokens.len());
    for (token, count) in tokens {
        eprintln!("    {token}: {count} bars");
    }
    ExitCode::SUCCESS
}
