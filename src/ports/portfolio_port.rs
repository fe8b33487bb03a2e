//! Portfolio / order execution port.
//!
//! The lifecycle queries position and capital through this trait and submits
//! buy and close requests; it never mutates portfolio state any other way.

use crate::domain::error::OrderRejected;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot {
    pub size: f64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub token_id: String,
    pub size: f64,
    pub price: f64,
    pub fee: f64,
}

pub trait PortfolioPort {
    /// Authoritative open position for `token_id`; `None` when flat.
    fn get_position(&self, token_id: &str) -> Option<PositionSnapshot>;

    /// Capital available for sizing new entries.
    fn get_capital(&self) -> f64;

    fn buy(&mut self, token_id: &str, size: f64) -> Result<OrderFill, OrderRejected>;

    /// Exit the full position in `token_id`.
    fn close(&mut self, token_id: &str) -> Result<OrderFill, OrderRejected>;
}
