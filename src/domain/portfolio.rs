//! Simulated portfolio: capital accounting, fills, and the trade ledger.
//!
//! Orders fill at the last price marked for the token. Fees are a fraction of
//! notional, added to buys and deducted from sale proceeds.

use std::collections::HashMap;

use super::error::OrderRejected;
use super::position::ClosedTrade;
use crate::ports::portfolio_port::{OrderFill, PortfolioPort, PositionSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: i64,
    pub token_id: String,
    pub side: TradeSide,
    pub size: f64,
    pub price: f64,
    pub fee: f64,
    /// Cash paid (buy, fee included) or received (sell, fee deducted).
    pub total: f64,
    pub capital_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Holding {
    size: f64,
    avg_price: f64,
    entry_timestamp: i64,
    entry_fees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mark {
    price: f64,
    timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPortfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub fee_rate: f64,
    holdings: HashMap<String, Holding>,
    marks: HashMap<String, Mark>,
    pub trades: Vec<TradeRecord>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl SimulatedPortfolio {
    pub fn new(initial_capital: f64, fee_rate: f64) -> Self {
        SimulatedPortfolio {
            cash: initial_capital,
            initial_capital,
            fee_rate,
            holdings: HashMap::new(),
            marks: HashMap::new(),
            trades: Vec::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Set the price at which the next orders for `token_id` fill.
    pub fn mark(&mut self, token_id: &str, price: f64, timestamp: i64) {
        self.marks
            .insert(token_id.to_string(), Mark { price, timestamp });
    }

    pub fn last_price(&self, token_id: &str) -> Option<f64> {
        self.marks.get(token_id).map(|m| m.price)
    }

    pub fn position_count(&self) -> usize {
        self.holdings.len()
    }

    /// Cash plus every holding valued at its last mark.
    pub fn total_equity(&self) -> f64 {
        let position_value: f64 = self
            .holdings
            .iter()
            .filter_map(|(token, h)| self.last_price(token).map(|p| h.size * p))
            .sum();
        self.cash + position_value
    }

    pub fn record_equity(&mut self, timestamp: i64) {
        let equity = self.total_equity();
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    pub fn open_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.holdings.keys().cloned().collect();
        tokens.sort();
        tokens
    }

    fn fill_price(&self, token_id: &str) -> Result<Mark, OrderRejected> {
        self.marks
            .get(token_id)
            .copied()
            .ok_or_else(|| OrderRejected::new(token_id, "no price for token"))
    }
}

impl PortfolioPort for SimulatedPortfolio {
    fn get_position(&self, token_id: &str) -> Option<PositionSnapshot> {
        self.holdings.get(token_id).map(|h| PositionSnapshot {
            size: h.size,
            avg_price: h.avg_price,
        })
    }

    fn get_capital(&self) -> f64 {
        self.cash
    }

    fn buy(&mut self, token_id: &str, size: f64) -> Result<OrderFill, OrderRejected> {
        if !(size > 0.0) || !size.is_finite() {
            return Err(OrderRejected::new(token_id, format!("invalid size {size}")));
        }
        let mark = self.fill_price(token_id)?;
        let notional = size * mark.price;
        let fee = notional * self.fee_rate;
        let total = notional + fee;
        if total > self.cash {
            return Err(OrderRejected::new(
                token_id,
                format!("insufficient capital: need {:.2}, have {:.2}", total, self.cash),
            ));
        }

        self.cash -= total;
        let holding = self
            .holdings
            .entry(token_id.to_string())
            .or_insert(Holding {
                size: 0.0,
                avg_price: 0.0,
                entry_timestamp: mark.timestamp,
                entry_fees: 0.0,
            });
        let new_size = holding.size + size;
        holding.avg_price = (holding.avg_price * holding.size + mark.price * size) / new_size;
        holding.size = new_size;
        holding.entry_fees += fee;

        self.trades.push(TradeRecord {
            timestamp: mark.timestamp,
            token_id: token_id.to_string(),
            side: TradeSide::Buy,
            size,
            price: mark.price,
            fee,
            total,
            capital_after: self.cash,
        });
        Ok(OrderFill {
            token_id: token_id.to_string(),
            size,
            price: mark.price,
            fee,
        })
    }

    fn close(&mut self, token_id: &str) -> Result<OrderFill, OrderRejected> {
        let mark = self.fill_price(token_id)?;
        let holding = self
            .holdings
            .remove(token_id)
            .ok_or_else(|| OrderRejected::new(token_id, "no position to close"))?;

        let notional = holding.size * mark.price;
        let fee = notional * self.fee_rate;
        let proceeds = notional - fee;
        self.cash += proceeds;

        let cost = holding.size * holding.avg_price + holding.entry_fees;
        self.closed_trades.push(ClosedTrade {
            token_id: token_id.to_string(),
            size: holding.size,
            entry_price: holding.avg_price,
            exit_price: mark.price,
            entry_timestamp: holding.entry_timestamp,
            exit_timestamp: mark.timestamp,
            fees: holding.entry_fees + fee,
            pnl: proceeds - cost,
        });
        self.trades.push(TradeRecord {
            timestamp: mark.timestamp,
            token_id: token_id.to_string(),
            side: TradeSide::Sell,
            size: holding.size,
            price: mark.price,
            fee,
            total: proceeds,
            capital_after: self.cash,
        });
        Ok(OrderFill {
            token_id: token_id.to_string(),
            size: holding.size,
            price: mark.price,
            fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(capital: f64, fee_rate: f64, token: &str, price: f64) -> SimulatedPortfolio {
        let mut pf = SimulatedPortfolio::new(capital, fee_rate);
        pf.mark(token, price, 100);
        pf
    }

    #[test]
    fn new_portfolio() {
        let pf = SimulatedPortfolio::new(1000.0, 0.0);
        assert_eq!(pf.cash, 1000.0);
        assert_eq!(pf.get_capital(), 1000.0);
        assert_eq!(pf.position_count(), 0);
        assert!(pf.trades.is_empty());
    }

    #[test]
    fn buy_deducts_cost_and_fee() {
        let mut pf = marked(1000.0, 0.01, "a", 0.5);
        let fill = pf.buy("a", 100.0).unwrap();
        assert_eq!(fill.price, 0.5);
        assert!((fill.fee - 0.5).abs() < 1e-12);
        assert!((pf.cash - (1000.0 - 50.0 - 0.5)).abs() < 1e-9);
        let pos = pf.get_position("a").unwrap();
        assert_eq!(pos.size, 100.0);
        assert_eq!(pos.avg_price, 0.5);
    }

    #[test]
    fn buy_rejected_when_unaffordable() {
        let mut pf = marked(10.0, 0.0, "a", 0.5);
        let err = pf.buy("a", 100.0).unwrap_err();
        assert!(err.reason.starts_with("insufficient capital"));
        assert_eq!(pf.cash, 10.0);
        assert!(pf.get_position("a").is_none());
    }

    #[test]
    fn buy_rejected_without_price() {
        let mut pf = SimulatedPortfolio::new(1000.0, 0.0);
        assert!(pf.buy("a", 1.0).is_err());
    }

    #[test]
    fn buy_rejects_non_positive_size() {
        let mut pf = marked(1000.0, 0.0, "a", 0.5);
        assert!(pf.buy("a", 0.0).is_err());
        assert!(pf.buy("a", -1.0).is_err());
    }

    #[test]
    fn adding_to_position_averages_price() {
        let mut pf = marked(1000.0, 0.0, "a", 0.4);
        pf.buy("a", 100.0).unwrap();
        pf.mark("a", 0.6, 101);
        pf.buy("a", 100.0).unwrap();
        let pos = pf.get_position("a").unwrap();
        assert_eq!(pos.size, 200.0);
        assert!((pos.avg_price - 0.5).abs() < 1e-12);
    }

    #[test]
    fn close_realizes_pnl_net_of_fees() {
        let mut pf = marked(1000.0, 0.01, "a", 0.5);
        pf.buy("a", 100.0).unwrap();
        pf.mark("a", 0.6, 200);
        let fill = pf.close("a").unwrap();
        assert_eq!(fill.size, 100.0);
        // proceeds 60 - 0.6, cost 50 + 0.5
        let trade = &pf.closed_trades[0];
        assert!((trade.pnl - (59.4 - 50.5)).abs() < 1e-9);
        assert!((trade.fees - 1.1).abs() < 1e-9);
        assert_eq!(trade.entry_timestamp, 100);
        assert_eq!(trade.exit_timestamp, 200);
        assert!((pf.cash - (1000.0 - 50.5 + 59.4)).abs() < 1e-9);
        assert!(pf.get_position("a").is_none());
        assert_eq!(pf.trades.len(), 2);
    }

    #[test]
    fn close_without_position_fails() {
        let mut pf = marked(1000.0, 0.0, "a", 0.5);
        let err = pf.close("a").unwrap_err();
        assert_eq!(err.reason, "no position to close");
    }

    #[test]
    fn total_equity_uses_marks() {
        let mut pf = marked(1000.0, 0.0, "a", 0.5);
        pf.buy("a", 100.0).unwrap();
        assert!((pf.total_equity() - 1000.0).abs() < 1e-9);
        pf.mark("a", 0.7, 101);
        assert!((pf.total_equity() - 1020.0).abs() < 1e-9);
        pf.record_equity(101);
        assert_eq!(pf.equity_curve.len(), 1);
        assert!((pf.equity_curve[0].equity - 1020.0).abs() < 1e-9);
    }

    #[test]
    fn open_tokens_sorted() {
        let mut pf = SimulatedPortfolio::new(1000.0, 0.0);
        pf.mark("b", 0.5, 1);
        pf.mark("a", 0.5, 1);
        pf.buy("b", 1.0).unwrap();
        pf.buy("a", 1.0).unwrap();
        assert_eq!(pf.open_tokens(), vec!["a".to_string(), "b".to_string()]);
    }
}
