//! Backtest driver.
//!
//! Replays bars through a strategy against a `SimulatedPortfolio`. Bars are
//! grouped by timestamp; within a timestamp tokens run in token-id order. The
//! portfolio is marked at each bar's close before the strategy sees the bar,
//! and one equity point is recorded per timestamp.

use chrono::{Days, NaiveDate};

use super::bar::Bar;
use super::config_validation::{
    DEFAULT_FEE_RATE, DEFAULT_INITIAL_CAPITAL, backtest_date, backtest_number,
    validate_backtest_config,
};
use super::error::ProbtraderError;
use super::events::EventSink;
use super::lifecycle::Action;
use super::metrics::Metrics;
use super::portfolio::SimulatedPortfolio;
use super::strategy::Strategy;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub fee_rate: f64,
    /// Inclusive lower bound, unix seconds.
    pub start_timestamp: Option<i64>,
    /// Exclusive upper bound, unix seconds.
    pub end_timestamp: Option<i64>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
            start_timestamp: None,
            end_timestamp: None,
        }
    }
}

impl BacktestConfig {
    /// Read and validate the `[backtest]` section. Dates are whole UTC days,
    /// so `end_date` includes every bar on that day.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ProbtraderError> {
        validate_backtest_config(config)?;
        let start_timestamp = backtest_date(config, "start_date")?.map(day_start);
        let end_timestamp = backtest_date(config, "end_date")?
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(day_start);
        Ok(Self {
            initial_capital: backtest_number(config, "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
            fee_rate: backtest_number(config, "fee_rate", DEFAULT_FEE_RATE)?,
            start_timestamp,
            end_timestamp,
        })
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start_timestamp.is_none_or(|s| timestamp >= s)
            && self.end_timestamp.is_none_or(|e| timestamp < e)
    }
}

fn day_start(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub portfolio: SimulatedPortfolio,
    pub bars_processed: usize,
    pub ignored_bars: usize,
    /// Distinct token ids seen, sorted.
    pub tokens: Vec<String>,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
}

impl BacktestResult {
    pub fn metrics(&self) -> Metrics {
        Metrics::compute(&self.portfolio)
    }
}

pub fn run_backtest(
    mut bars: Vec<Bar>,
    strategy: &mut dyn Strategy,
    config: &BacktestConfig,
    events: &mut dyn EventSink,
) -> Result<BacktestResult, ProbtraderError> {
    let loaded = bars.len();
    bars.retain(|b| config.contains(b.timestamp));
    if bars.is_empty() {
        return Err(ProbtraderError::NoData {
            reason: format!("no bars inside the backtest window ({loaded} loaded)"),
        });
    }
    bars.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.token_id.cmp(&b.token_id))
    });

    tracing::info!(
        strategy = strategy.name(),
        bars = bars.len(),
        skipped = loaded - bars.len(),
        initial_capital = config.initial_capital,
        fee_rate = config.fee_rate,
        "starting backtest"
    );

    let mut portfolio = SimulatedPortfolio::new(config.initial_capital, config.fee_rate);
    let mut tokens: Vec<String> = Vec::new();
    let mut ignored_bars = 0usize;

    for group in bars.chunk_by(|a, b| a.timestamp == b.timestamp) {
        let mut previous_token: Option<&str> = None;
        for bar in group {
            // a repeated (timestamp, token) pair must not move the fill price
            if previous_token != Some(bar.token_id.as_str()) {
                portfolio.mark(&bar.token_id, bar.close, bar.timestamp);
            }
            previous_token = Some(bar.token_id.as_str());

            if strategy.on_bar(bar, &mut portfolio, events) == Action::Ignored {
                ignored_bars += 1;
            }
            if let Err(pos) = tokens.binary_search(&bar.token_id) {
                tokens.insert(pos, bar.token_id.clone());
            }
        }
        portfolio.record_equity(group[0].timestamp);
    }

    let first_timestamp = bars.first().map_or(0, |b| b.timestamp);
    let last_timestamp = bars.last().map_or(0, |b| b.timestamp);

    tracing::info!(
        trades = portfolio.trades.len(),
        closed = portfolio.closed_trades.len(),
        open = portfolio.position_count(),
        equity = portfolio.total_equity(),
        "backtest finished"
    );

    Ok(BacktestResult {
        strategy_name: strategy.name().to_string(),
        portfolio,
        bars_processed: bars.len(),
        ignored_bars,
        tokens,
        first_timestamp,
        last_timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::events::{NullSink, RecordingSink};
    use crate::domain::indicator::IndicatorKind;
    use crate::domain::lifecycle::Lifecycle;
    use crate::domain::params::ParamMap;
    use crate::domain::position::{ExitReason, ExitRules, Position};
    use crate::domain::strategy::build_strategy;
    use crate::ports::portfolio_port::PortfolioPort;
    use approx::assert_relative_eq;

    /// Records the order bars arrive in.
    struct Recorder {
        seen: Vec<(i64, String)>,
        lifecycle: Lifecycle,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                seen: Vec::new(),
                lifecycle: Lifecycle::new(ExitRules::default(), 0.1),
            }
        }
    }

    impl Strategy for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_bar(&mut self, bar: &Bar, _portfolio: &mut dyn PortfolioPort, _events: &mut dyn EventSink) -> Action {
            self.seen.push((bar.timestamp, bar.token_id.clone()));
            Action::None
        }

        fn position(&self, _token_id: &str) -> Option<&Position> {
            None
        }

        fn indicators(&self) -> Vec<IndicatorKind> {
            Vec::new()
        }

        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }
    }

    fn price_bars(token: &str, closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::from_price(token, 1_700_000_000 + i as i64 * 60, *c))
            .collect()
    }

    #[test]
    fn empty_input_is_no_data() {
        let mut strategy = Recorder::new();
        let err = run_backtest(Vec::new(), &mut strategy, &BacktestConfig::default(), &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, ProbtraderError::NoData { .. }));
    }

    #[test]
    fn processes_by_timestamp_then_token() {
        let bars = vec![
            Bar::from_price("b", 20, 0.5),
            Bar::from_price("a", 20, 0.4),
            Bar::from_price("b", 10, 0.3),
            Bar::from_price("a", 10, 0.2),
        ];
        let mut strategy = Recorder::new();
        let result =
            run_backtest(bars, &mut strategy, &BacktestConfig::default(), &mut NullSink).unwrap();

        let order: Vec<(i64, &str)> = strategy
            .seen
            .iter()
            .map(|(ts, tok)| (*ts, tok.as_str()))
            .collect();
        assert_eq!(order, vec![(10, "a"), (10, "b"), (20, "a"), (20, "b")]);
        assert_eq!(result.portfolio.equity_curve.len(), 2);
        assert_eq!(result.tokens, vec!["a", "b"]);
        assert_eq!((result.first_timestamp, result.last_timestamp), (10, 20));
        assert_eq!(result.strategy_name, "recorder");
    }

    #[test]
    fn date_window_filters_bars() {
        // 2024-01-01T00:00:00Z and the two following midnights
        let day = 86_400;
        let jan1 = 1_704_067_200;
        let bars = vec![
            Bar::from_price("a", jan1 - 1, 0.5),
            Bar::from_price("a", jan1, 0.5),
            Bar::from_price("a", jan1 + day + 3_600, 0.5),
            Bar::from_price("a", jan1 + 2 * day, 0.5),
        ];
        let config = FileConfigAdapter::from_string(
            "[backtest]\nstart_date = 2024-01-01\nend_date = 2024-01-02\n",
        )
        .unwrap();
        let config = BacktestConfig::from_config(&config).unwrap();
        assert_eq!(config.start_timestamp, Some(jan1));
        assert_eq!(config.end_timestamp, Some(jan1 + 2 * day));

        let mut strategy = Recorder::new();
        let result = run_backtest(bars, &mut strategy, &config, &mut NullSink).unwrap();
        assert_eq!(result.bars_processed, 2);
    }

    #[test]
    fn window_with_no_bars_is_no_data() {
        let config = BacktestConfig {
            start_timestamp: Some(1_000_000),
            ..BacktestConfig::default()
        };
        let mut strategy = Recorder::new();
        let err = run_backtest(price_bars("a", &[0.5]), &mut strategy, &config, &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, ProbtraderError::NoData { .. }));
    }

    #[test]
    fn from_config_defaults() {
        let config = BacktestConfig::from_config(&FileConfigAdapter::from_string("").unwrap()).unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.initial_capital, 1000.0);
        assert_eq!(config.fee_rate, 0.0);
    }

    #[test]
    fn from_config_rejects_invalid_values() {
        let config = FileConfigAdapter::from_string("[backtest]\nfee_rate = 2\n").unwrap();
        assert!(matches!(
            BacktestConfig::from_config(&config),
            Err(ProbtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn duplicate_bar_is_ignored_and_does_not_move_price() {
        let bars = vec![
            Bar::from_price("a", 10, 0.5),
            Bar::from_price("a", 20, 0.6),
            Bar::from_price("a", 20, 0.9),
        ];
        let mut strategy = build_strategy("sma_cross", &ParamMap::new()).unwrap();
        let mut sink = RecordingSink::new();
        let result = run_backtest(bars, strategy.as_mut(), &BacktestConfig::default(), &mut sink).unwrap();
        assert_eq!(result.ignored_bars, 1);
        assert_eq!(result.portfolio.last_price("a"), Some(0.6));
    }

    #[test]
    fn sma_cross_round_trip() {
        let params = ParamMap::new()
            .with("fast_period", 2.0)
            .with("slow_period", 3.0)
            .with("stop_loss", 0.0);
        let mut strategy = build_strategy("sma_cross", &params).unwrap();
        let bars = price_bars("a", &[0.50, 0.50, 0.50, 0.48, 0.60, 0.62, 0.64, 0.40]);
        let mut sink = RecordingSink::new();
        let result =
            run_backtest(bars, strategy.as_mut(), &BacktestConfig::default(), &mut sink).unwrap();

        assert_eq!(sink.entries(), 1);
        assert_eq!(sink.exits(), vec![ExitReason::Signal("cross_below")]);
        assert_eq!(result.portfolio.trades.len(), 2);
        assert_eq!(result.portfolio.closed_trades.len(), 1);
        assert_eq!(result.portfolio.equity_curve.len(), 8);
        assert_eq!(result.portfolio.position_count(), 0);

        let trade = &result.portfolio.closed_trades[0];
        assert_relative_eq!(trade.entry_price, 0.60);
        assert_relative_eq!(trade.exit_price, 0.40);
        let metrics = result.metrics();
        assert!(metrics.total_return < 0.0);
        assert_eq!(metrics.trades_lost, 1);
        assert_relative_eq!(
            metrics.final_equity,
            result.portfolio.cash,
            epsilon = 1e-9
        );
    }
}
