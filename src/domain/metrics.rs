//! Performance metrics over a finished backtest.
//!
//! Risk ratios use per-step equity returns (one step per timestamp) scaled by
//! sqrt(252), with the population standard deviation.

use std::collections::BTreeMap;

use super::portfolio::{EquityPoint, SimulatedPortfolio};
use super::position::ClosedTrade;

const PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    /// Longest run of steps spent below a previous equity peak.
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_hold_seconds: f64,
}

impl Metrics {
    pub fn compute(portfolio: &SimulatedPortfolio) -> Self {
        let equity_curve = &portfolio.equity_curve;
        let initial_capital = portfolio.initial_capital;

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve);
        let stats = TradeStats::from_trades(&portfolio.closed_trades);

        Metrics {
            final_equity,
            total_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades: portfolio.trades.len(),
            trades_won: stats.won,
            trades_lost: stats.lost,
            trades_breakeven: stats.breakeven,
            win_rate: stats.win_rate(),
            profit_factor: stats.profit_factor(),
            avg_win: ratio(stats.total_wins, stats.won),
            avg_loss: ratio(stats.total_losses, stats.lost),
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            avg_hold_seconds: ratio(stats.hold_seconds as f64, stats.count()),
        }
    }
}

/// Round-trip summary for one token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenResult {
    pub token_id: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
}

impl TokenResult {
    /// One entry per token with closed trades, sorted by token id.
    pub fn compute_per_token(trades: &[ClosedTrade]) -> Vec<TokenResult> {
        let mut by_token: BTreeMap<&str, Vec<&ClosedTrade>> = BTreeMap::new();
        for trade in trades {
            by_token.entry(trade.token_id.as_str()).or_default().push(trade);
        }
        by_token
            .into_iter()
            .map(|(token_id, trades)| {
                let winning_trades = trades.iter().filter(|t| t.is_win()).count();
                TokenResult {
                    token_id: token_id.to_string(),
                    total_trades: trades.len(),
                    winning_trades,
                    total_pnl: trades.iter().map(|t| t.pnl).sum(),
                    win_rate: ratio(winning_trades as f64, trades.len()),
                }
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    won: usize,
    lost: usize,
    breakeven: usize,
    total_wins: f64,
    total_losses: f64,
    largest_win: f64,
    largest_loss: f64,
    hold_seconds: i64,
}

impl TradeStats {
    fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut stats = TradeStats::default();
        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                stats.won += 1;
                stats.total_wins += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < 0.0 {
                stats.lost += 1;
                stats.total_losses += pnl.abs();
                stats.largest_loss = stats.largest_loss.max(pnl.abs());
            } else {
                stats.breakeven += 1;
            }
            stats.hold_seconds += trade.exit_timestamp - trade.entry_timestamp;
        }
        stats
    }

    fn count(&self) -> usize {
        self.won + self.lost + self.breakeven
    }

    fn win_rate(&self) -> f64 {
        ratio(self.won as f64, self.count())
    }

    fn profit_factor(&self) -> f64 {
        if self.total_losses > 0.0 {
            self.total_wins / self.total_losses
        } else if self.total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count > 0 { total / count as f64 } else { 0.0 }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}

fn step_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint]) -> (f64, f64) {
    let returns = step_returns(equity_curve);
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let sharpe = if stddev > 0.0 {
        mean / stddev * PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside = returns
        .iter()
        .filter(|r| **r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside.sqrt();
    let sortino = if downside_stddev > 0.0 {
        mean / downside_stddev * PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
