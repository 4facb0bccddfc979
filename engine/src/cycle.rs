//! The cycle entity: one per-symbol price-grid state machine.

use chrono::{DateTime, Utc};
use gridloop_markets::{CycleKind, CycleStatus, OpenedBy, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A long-lived grid-trading state machine owning a set of broker orders
/// around an initial entry price.
///
/// Order sets hold broker ticket numbers only; hydrating a ticket into a
/// full `gridloop_execution::Order` is the caller's job (via an
/// `OrderRepository`), keeping this type free of any store/gateway
/// dependency beyond the identifiers it tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: String,
    pub remote_id: Option<String>,
    pub bot_id: String,
    pub account_id: String,
    pub symbol: String,
    pub magic: i64,
    pub kind: CycleKind,

    pub open_price: Decimal,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
    pub threshold_lower: Decimal,
    pub threshold_upper: Decimal,
    #[serde(default)]
    pub initial_threshold_price: Decimal,
    pub zone_base_price: Decimal,
    pub recovery_zone_base_price: Option<Decimal>,
    pub initial_stop_loss_price: Option<Decimal>,

    #[serde(default = "default_current_direction")]
    pub current_direction: Side,
    #[serde(default)]
    pub direction_switched: bool,
    pub direction_switches: u32,
    #[serde(default)]
    pub next_order_index: u32,
    #[serde(default)]
    pub done_price_levels: Vec<Decimal>,

    pub initial: Vec<i64>,
    pub hedge: Vec<i64>,
    pub pending: Vec<i64>,
    pub closed: Vec<i64>,
    pub recovery: Vec<i64>,
    pub threshold: Vec<i64>,
    pub active_orders: Vec<i64>,
    pub completed_orders: Vec<i64>,

    pub total_volume: Decimal,
    pub total_profit: Decimal,
    /// Running loss of the *current* batch; folded into `batch_losses`
    /// and reset to zero each time the batch stop-loss trips.
    pub accumulated_loss: Decimal,
    pub batch_losses: Vec<Decimal>,
    pub lot_idx: usize,

    pub status: CycleStatus,
    pub is_closed: bool,
    pub is_pending: bool,
    pub opened_by: OpenedBy,
    pub closing_method: Option<String>,
    pub close_reason: Option<String>,
    pub close_time: Option<DateTime<Utc>>,

    /// Set once a zone crossing in the adverse direction has already
    /// triggered a hedge, so the engine doesn't re-hedge on every tick
    /// the price stays beyond the zone boundary.
    pub hedge_fired: bool,
}

/// Legacy-row default for `current_direction` (§4.2: "current_direction
/// (text, default BUY)").
fn default_current_direction() -> Side {
    Side::Buy
}

impl Cycle {
    /// Anchors the zone model around `open_price` using `pip`-scaled
    /// `zone_pips`/`zone_forward2_pips` distances: `lower/upper_bound`
    /// first, then `threshold_lower/upper` extended past them.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: impl Into<String>,
        bot_id: impl Into<String>,
        account_id: impl Into<String>,
        symbol: impl Into<String>,
        magic: i64,
        kind: CycleKind,
        side: Side,
        open_price: Decimal,
        initial_ticket: i64,
        initial_volume: Decimal,
        pip: Decimal,
        zone_pips: Decimal,
        zone_forward2_pips: Decimal,
        opened_by: OpenedBy,
    ) -> Self {
        let (lower_bound, upper_bound) = Self::zone_bounds(open_price, pip, zone_pips);
        let (threshold_lower, threshold_upper) =
            Self::threshold_bounds(lower_bound, upper_bound, pip, zone_forward2_pips);

        Self {
            id: id.into(),
            remote_id: None,
            bot_id: bot_id.into(),
            account_id: account_id.into(),
            symbol: symbol.into(),
            magic,
            kind,
            open_price,
            lower_bound,
            upper_bound,
            threshold_lower,
            threshold_upper,
            initial_threshold_price: open_price,
            zone_base_price: open_price,
            recovery_zone_base_price: None,
            initial_stop_loss_price: None,
            current_direction: side,
            direction_switched: false,
            direction_switches: 0,
            next_order_index: 0,
            done_price_levels: Vec::new(),
            initial: vec![initial_ticket],
            hedge: Vec::new(),
            pending: Vec::new(),
            closed: Vec::new(),
            recovery: Vec::new(),
            threshold: Vec::new(),
            active_orders: vec![initial_ticket],
            completed_orders: Vec::new(),
            total_volume: initial_volume,
            total_profit: Decimal::ZERO,
            accumulated_loss: Decimal::ZERO,
            batch_losses: Vec::new(),
            lot_idx: 0,
            status: CycleStatus::Initial,
            is_closed: false,
            is_pending: false,
            opened_by,
            closing_method: None,
            close_reason: None,
            close_time: None,
            hedge_fired: false,
        }
    }

    fn zone_bounds(base: Decimal, pip: Decimal, zone_pips: Decimal) -> (Decimal, Decimal) {
        let half = zone_pips * pip;
        (base - half, base + half)
    }

    fn threshold_bounds(
        lower_bound: Decimal,
        upper_bound: Decimal,
        pip: Decimal,
        zone_forward2_pips: Decimal,
    ) -> (Decimal, Decimal) {
        let forward = zone_forward2_pips * pip;
        (lower_bound - forward, upper_bound + forward)
    }

    /// Re-anchors the zone and threshold bounds around a new base price,
    /// used when the cycle enters recovery mode (the zone pins to
    /// `recovery_zone_base_price` instead of `open_price` until the
    /// recovery closes).
    pub fn reanchor_zone(&mut self, base: Decimal, pip: Decimal, zone_pips: Decimal, zone_forward2_pips: Decimal) {
        let (lower_bound, upper_bound) = Self::zone_bounds(base, pip, zone_pips);
        let (threshold_lower, threshold_upper) =
            Self::threshold_bounds(lower_bound, upper_bound, pip, zone_forward2_pips);
        self.zone_base_price = base;
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
        self.threshold_lower = threshold_lower;
        self.threshold_upper = threshold_upper;
    }

    /// Moves a ticket out of whichever active set currently holds it
    /// (and out of `active_orders`) and into `closed`/`completed_orders`.
    pub(crate) fn move_to_closed(&mut self, ticket: i64) {
        for set in [
            &mut self.initial,
            &mut self.hedge,
            &mut self.pending,
            &mut self.recovery,
            &mut self.threshold,
            &mut self.active_orders,
        ] {
            set.retain(|t| *t != ticket);
        }
        if !self.closed.contains(&ticket) {
            self.closed.push(ticket);
            self.completed_orders.push(ticket);
        }
    }

    /// True once `close_cycle`/take-profit/batch-close has run; a no-op
    /// target for any further close request.
    pub fn is_terminally_closed(&self) -> bool {
        self.is_closed && self.status == CycleStatus::Closed
    }

    /// Marks the cycle closed for `reason`, via `method`, at `now`.
    /// Idempotent: closing an already-closed cycle changes nothing.
    pub fn mark_closed(&mut self, method: &str, reason: &str, now: DateTime<Utc>) {
        if self.is_terminally_closed() {
            return;
        }
        self.status = CycleStatus::Closed;
        self.is_closed = true;
        self.is_pending = false;
        self.closing_method = Some(method.to_string());
        self.close_reason = Some(reason.to_string());
        self.close_time = Some(now);
    }

    /// Whether `price` has pierced the threshold opposite the cycle's
    /// current direction (the reversal trigger).
    pub fn pierces_opposite_threshold(&self, price: Decimal) -> bool {
        match self.current_direction {
            Side::Buy => price <= self.threshold_lower,
            Side::Sell => price >= self.threshold_upper,
        }
    }

    /// Whether `price` has crossed the zone boundary adverse to the
    /// cycle's current direction (the hedge trigger), which is a nearer
    /// boundary than the reversal threshold.
    pub fn crosses_adverse_zone(&self, price: Decimal) -> bool {
        match self.current_direction {
            Side::Buy => price <= self.lower_bound,
            Side::Sell => price >= self.upper_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn opened() -> Cycle {
        Cycle::open(
            "cycle-1",
            "bot-1",
            "acct-1",
            "EURUSD",
            12345,
            CycleKind::Buy,
            Side::Buy,
            dec!(1.10000),
            1,
            dec!(0.01),
            dec!(0.0001),
            dec!(500),
            dec!(1),
            OpenedBy::engine(),
        )
    }

    #[test]
    fn zone_and_threshold_bounds_match_s1_s2_literal_values() {
        let cycle = opened();
        assert_eq!(cycle.lower_bound, dec!(1.05000));
        assert_eq!(cycle.upper_bound, dec!(1.15000));
        assert_eq!(cycle.threshold_lower, dec!(1.04990));
        assert_eq!(cycle.threshold_upper, dec!(1.15001));
    }

    #[test]
    fn reversal_trigger_only_fires_past_the_threshold() {
        let cycle = opened();
        assert!(!cycle.pierces_opposite_threshold(dec!(1.04995)));
        assert!(cycle.pierces_opposite_threshold(dec!(1.04990)));
    }

    #[test]
    fn closing_an_already_closed_cycle_is_a_no_op() {
        let mut cycle = opened();
        let now = Utc::now();
        cycle.mark_closed("take_profit", "target reached", now);
        let first_close_time = cycle.close_time;
        cycle.mark_closed("manual", "ignored", now);
        assert_eq!(cycle.closing_method.as_deref(), Some("take_profit"));
        assert_eq!(cycle.close_time, first_close_time);
    }

    #[test]
    fn move_to_closed_relocates_a_ticket_exactly_once() {
        let mut cycle = opened();
        cycle.move_to_closed(1);
        assert!(cycle.active_orders.is_empty());
        assert_eq!(cycle.closed, vec![1]);
        cycle.move_to_closed(1);
        assert_eq!(cycle.closed, vec![1], "re-closing the same ticket must not duplicate it");
    }
}
