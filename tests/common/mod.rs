#![allow(dead_code)]

use probtrader::domain::bar::Bar;
use probtrader::domain::error::{OrderRejected, ProbtraderError};
use probtrader::domain::events::RecordingSink;
use probtrader::domain::lifecycle::Action;
use probtrader::domain::strategy::Strategy;
use probtrader::ports::data_port::DataPort;
use probtrader::ports::portfolio_port::{OrderFill, PortfolioPort, PositionSnapshot};
use std::collections::HashMap;
use std::io::Write;

pub const START_TS: i64 = 1_700_000_000;
pub const STEP: i64 = 60;

pub fn make_bar(token: &str, index: usize, close: f64) -> Bar {
    Bar::from_price(token, START_TS + index as i64 * STEP, close)
}

pub fn price_bars(token: &str, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| make_bar(token, i, *c))
        .collect()
}

pub fn flat_bars(token: &str, close: f64, count: usize) -> Vec<Bar> {
    (0..count).map(|i| make_bar(token, i, close)).collect()
}

/// Bars as a `token_id,timestamp,price` CSV.
pub fn price_csv(bars: &[Bar]) -> String {
    let mut out = String::from("token_id,timestamp,price\n");
    for bar in bars {
        out.push_str(&format!("{},{},{}\n", bar.token_id, bar.timestamp, bar.close));
    }
    out
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub struct MockDataPort {
    pub bars: Vec<Bar>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }
}

impl DataPort for MockDataPort {
    fn load_bars(&self) -> Result<Vec<Bar>, ProbtraderError> {
        Ok(self.bars.clone())
    }
}

/// Portfolio with fixed capital that records orders and can be told to refuse them.
#[derive(Default)]
pub struct MockPortfolio {
    pub capital: f64,
    pub positions: HashMap<String, PositionSnapshot>,
    pub buys: Vec<(String, f64)>,
    pub closes: Vec<String>,
    pub reject_buys: bool,
    pub reject_closes: bool,
}

impl MockPortfolio {
    pub fn new(capital: f64) -> Self {
        Self {
            capital,
            ..Self::default()
        }
    }

    /// A position the strategy did not open.
    pub fn with_external_position(mut self, token: &str, size: f64) -> Self {
        self.positions.insert(
            token.to_string(),
            PositionSnapshot {
                size,
                avg_price: 0.5,
            },
        );
        self
    }
}

impl PortfolioPort for MockPortfolio {
    fn get_position(&self, token_id: &str) -> Option<PositionSnapshot> {
        self.positions.get(token_id).copied()
    }

    fn get_capital(&self) -> f64 {
        self.capital
    }

    fn buy(&mut self, token_id: &str, size: f64) -> Result<OrderFill, OrderRejected> {
        if self.reject_buys {
            return Err(OrderRejected::new(token_id, "buys disabled"));
        }
        self.buys.push((token_id.to_string(), size));
        self.positions.insert(
            token_id.to_string(),
            PositionSnapshot {
                size,
                avg_price: 0.0,
            },
        );
        Ok(OrderFill {
            token_id: token_id.to_string(),
            size,
            price: 0.0,
            fee: 0.0,
        })
    }

    fn close(&mut self, token_id: &str) -> Result<OrderFill, OrderRejected> {
        if self.reject_closes {
            return Err(OrderRejected::new(token_id, "closes disabled"));
        }
        let position = self
            .positions
            .remove(token_id)
            .ok_or_else(|| OrderRejected::new(token_id, "no position"))?;
        self.closes.push(token_id.to_string());
        Ok(OrderFill {
            token_id: token_id.to_string(),
            size: position.size,
            price: 0.0,
            fee: 0.0,
        })
    }
}

pub fn drive(
    strategy: &mut dyn Strategy,
    bars: &[Bar],
    portfolio: &mut dyn PortfolioPort,
    sink: &mut RecordingSink,
) -> Vec<Action> {
    bars.iter()
        .map(|bar| strategy.on_bar(bar, portfolio, sink))
        .collect()
}

pub fn entry_indices(actions: &[Action]) -> Vec<usize> {
    actions
        .iter()
        .enumerate()
        .filter(|(_, a)| matches!(a, Action::Entered { .. }))
        .map(|(i, _)| i)
        .collect()
}
