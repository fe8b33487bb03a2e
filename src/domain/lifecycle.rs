//! Per-token position lifecycle: Flat <-> Open.
//!
//! One `step` per token per bar, always after that bar's indicator updates.
//! Exactly one of {nothing, exit, entry} happens; entry is never considered on
//! a bar that evaluated exits. The portfolio collaborator is the ground truth
//! for whether a position exists. Local bookkeeping (entry price, high water,
//! bars held) is created only when our own buy succeeds.

use std::collections::HashMap;

use crate::domain::bar::Bar;
use crate::domain::events::{EventSink, LifecycleEvent};
use crate::domain::position::{ExitReason, ExitRules, Position};
use crate::ports::portfolio_port::PortfolioPort;

/// Prices outside this open interval are near-certain outcomes and never entered.
pub const TRADABLE_BAND: (f64, f64) = (0.05, 0.95);

/// Haircut applied to the cash allotted to an entry.
pub const FEE_BUFFER: f64 = 0.995;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    Entered { size: f64 },
    EntryRejected,
    Exited(ExitReason),
    /// Bar rejected before any indicator update (out of order or duplicate).
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lifecycle {
    pub rules: ExitRules,
    pub risk_percent: f64,
    pub fee_buffer: f64,
    pub band: (f64, f64),
}

impl Lifecycle {
    pub fn new(rules: ExitRules, risk_percent: f64) -> Self {
        Self {
            rules,
            risk_percent,
            fee_buffer: FEE_BUFFER,
            band: TRADABLE_BAND,
        }
    }

    pub fn in_band(&self, close: f64) -> bool {
        close > self.band.0 && close < self.band.1
    }

    /// `capital * risk * fee_buffer / close`, or `None` when the order would be
    /// empty, non-finite or larger than the available capital.
    pub fn order_size(&self, capital: f64, close: f64) -> Option<f64> {
        let cash = capital * self.risk_percent * self.fee_buffer;
        let size = cash / close;
        if size > 0.0 && size.is_finite() && cash <= capital {
            Some(size)
        } else {
            None
        }
    }

    /// Advance one token by one bar.
    ///
    /// `ready` is false while the strategy's indicators are warming up; the
    /// open position is still rolled forward but no decision is made.
    /// `entry` and `exit` are evaluated lazily and only in their own state.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        slot: &mut Option<Position>,
        bar: &Bar,
        ready: bool,
        portfolio: &mut dyn PortfolioPort,
        events: &mut dyn EventSink,
        entry: impl FnOnce() -> bool,
        exit: impl FnOnce(&Position) -> Option<&'static str>,
    ) -> Action {
        let held = portfolio
            .get_position(&bar.token_id)
            .is_some_and(|p| p.size > 0.0);

        if held {
            let Some(pos) = slot.as_mut() else {
                // opened outside this lifecycle; nothing to manage
                return Action::None;
            };
            pos.advance(bar.close);
            if !ready {
                return Action::None;
            }
            let pos: &Position = pos;
            let Some(reason) = self.rules.evaluate(pos, bar.close, || exit(pos)) else {
                return Action::None;
            };

            if let Err(err) = portfolio.close(&bar.token_id) {
                events.emit(LifecycleEvent::CloseFailed {
                    token_id: bar.token_id.clone(),
                    timestamp: bar.timestamp,
                    reason: err.reason,
                });
            }
            *slot = None;
            events.emit(LifecycleEvent::Exited {
                token_id: bar.token_id.clone(),
                timestamp: bar.timestamp,
                price: bar.close,
                reason,
            });
            return Action::Exited(reason);
        }

        // collaborator says flat: any local record is stale
        *slot = None;

        if !ready || !self.in_band(bar.close) || !entry() {
            return Action::None;
        }
        let Some(size) = self.order_size(portfolio.get_capital(), bar.close) else {
            return Action::None;
        };

        match portfolio.buy(&bar.token_id, size) {
            Ok(fill) => {
                *slot = Some(Position::open(&bar.token_id, bar.close, bar.timestamp));
                events.emit(LifecycleEvent::Entered {
                    token_id: bar.token_id.clone(),
                    timestamp: bar.timestamp,
                    price: bar.close,
                    size: fill.size,
                });
                Action::Entered { size: fill.size }
            }
            Err(err) => {
                events.emit(LifecycleEvent::EntryRejected {
                    token_id: bar.token_id.clone(),
                    timestamp: bar.timestamp,
                    reason: err.reason,
                });
                Action::EntryRejected
            }
        }
    }
}

/// Index of a token's slot in the `TokenBook` that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHandle(usize);

#[derive(Debug, Clone)]
pub struct TokenSlot<S> {
    pub token_id: String,
    pub state: S,
    pub position: Option<Position>,
    /// Bars accepted for this token; used as the bar index for windowed detectors.
    pub bars_seen: u64,
    pub last_timestamp: Option<i64>,
}

impl<S> TokenSlot<S> {
    /// Accept a bar if its timestamp is strictly after the last accepted one.
    /// On rejection returns the last accepted timestamp.
    pub fn accept(&mut self, timestamp: i64) -> Result<(), i64> {
        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                return Err(last);
            }
        }
        self.last_timestamp = Some(timestamp);
        self.bars_seen += 1;
        Ok(())
    }
}

/// Token-scoped state: one slot per token, created lazily on its first bar and
/// looked up once per bar through a handle.
#[derive(Debug, Clone)]
pub struct TokenBook<S> {
    index: HashMap<String, TokenHandle>,
    slots: Vec<TokenSlot<S>>,
}

impl<S> Default for TokenBook<S> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
        }
    }
}

impl<S> TokenBook<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, token_id: &str) -> Option<TokenHandle> {
        self.index.get(token_id).copied()
    }

    pub fn handle_or_insert_with(&mut self, token_id: &str, init: impl FnOnce() -> S) -> TokenHandle {
        if let Some(h) = self.index.get(token_id) {
            return *h;
        }
        let handle = TokenHandle(self.slots.len());
        self.slots.push(TokenSlot {
            token_id: token_id.to_string(),
            state: init(),
            position: None,
            bars_seen: 0,
            last_timestamp: None,
        });
        self.index.insert(token_id.to_string(), handle);
        handle
    }

    pub fn slot(&self, handle: TokenHandle) -> &TokenSlot<S> {
        &self.slots[handle.0]
    }

    pub fn slot_mut(&mut self, handle: TokenHandle) -> &mut TokenSlot<S> {
        &mut self.slots[handle.0]
    }

    pub fn position(&self, token_id: &str) -> Option<&Position> {
        self.handle(token_id)
            .and_then(|h| self.slot(h).position.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenSlot<S>> {
        self.slots.iter()
    }
}
