//! Per (bot, account, symbol) append-only loss ledger (§3,
//! "GlobalLossTracker").

use gridloop_markets::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single booked loss, classified by the source that produced it so the
/// tracker can answer "how much did hedging cost us" separately from
/// "how much did grid-step reversals cost us".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossSource {
    Hedge,
    Reversal,
    BatchStopLoss,
    ManualClose,
}

/// Append-updated by the Cycle Engine whenever a cycle (or one of its
/// orders) closes at a loss. Never mutates past entries, only appends and
/// re-derives the running totals — mirrors the broker/remote-store
/// failure semantics of §4.5.5: a write failure here never unwinds a
/// broker-side close.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalLossTracker {
    pub bot_id: String,
    pub account_id: String,
    pub symbol: String,
    losses_by_source: Vec<(LossSource, Decimal)>,
    pub cycle_count: u64,
    pub last_loss: Option<Decimal>,
    pub last_loss_side: Option<Side>,
}

impl GlobalLossTracker {
    pub fn new(bot_id: impl Into<String>, account_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            account_id: account_id.into(),
            symbol: symbol.into(),
            losses_by_source: Vec::new(),
            cycle_count: 0,
            last_loss: None,
            last_loss_side: None,
        }
    }

    /// Records one loss event. `amount` is expected negative (a loss);
    /// positive values are recorded as-is so callers can also use this to
    /// net a recovered amount against the running total.
    pub fn record_loss(&mut self, source: LossSource, amount: Decimal, side: Side) {
        self.losses_by_source.push((source, amount));
        self.last_loss = Some(amount);
        self.last_loss_side = Some(side);
    }

    pub fn record_cycle_closed(&mut self) {
        self.cycle_count += 1;
    }

    pub fn total_loss(&self) -> Decimal {
        self.losses_by_source.iter().map(|(_, amount)| *amount).sum()
    }

    pub fn total_loss_for(&self, source: LossSource) -> Decimal {
        self.losses_by_source
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accumulates_losses_by_source_independently() {
        let mut tracker = GlobalLossTracker::new("bot-1", "acct-1", "EURUSD");
        tracker.record_loss(LossSource::Hedge, dec!(-2.50), Side::Sell);
        tracker.record_loss(LossSource::Reversal, dec!(-1.00), Side::Buy);
        tracker.record_loss(LossSource::Hedge, dec!(-0.50), Side::Sell);

        assert_eq!(tracker.total_loss_for(LossSource::Hedge), dec!(-3.00));
        assert_eq!(tracker.total_loss_for(LossSource::Reversal), dec!(-1.00));
        assert_eq!(tracker.total_loss(), dec!(-4.00));
        assert_eq!(tracker.last_loss, Some(dec!(-0.50)));
    }

    #[test]
    fn tracks_closed_cycle_count() {
        let mut tracker = GlobalLossTracker::new("bot-1", "acct-1", "EURUSD");
        tracker.record_cycle_closed();
        tracker.record_cycle_closed();
        assert_eq!(tracker.cycle_count, 2);
    }
}
