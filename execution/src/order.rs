use crate::error::ExecutionError;
use gridloop_gateway::BrokerGateway;
use gridloop_markets::{OrderKind, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where an order stands with respect to the two-phase false-closed
/// verification: absent on one read is only a candidate, not yet a
/// committed closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum VerificationState {
    Open,
    Candidate,
}

/// One broker ticket, mirrored locally. Holds no repository handle
/// itself — `OrderRepository` is a separate port, implemented by the
/// local store, so this type stays free of persistence concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub ticket: i64,
    pub kind: OrderKind,
    pub side: Side,
    pub symbol: String,
    pub magic: i64,
    pub open_price: Decimal,
    pub volume: Decimal,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
    pub trailing_steps: i32,
    pub swap: Decimal,
    pub commission: Decimal,
    pub profit: Decimal,
    pub is_pending: bool,
    pub is_closed: bool,
    pub cycle_id: String,
    pub account_id: String,
    verification: VerificationState,
}

/// Outcome of one [`Order::refresh_from_broker`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The order is still tracked by the broker and nothing changed.
    Unchanged,
    /// The order is still tracked by the broker and at least one field
    /// (profit, SL, TP, volume, pending/closed flag) changed.
    Updated,
    /// The order is absent from both the broker's open positions and
    /// pending orders on this read. Not yet committed as closed — see
    /// [`Order::check_false_closed_cycle`].
    CandidateClosed,
}

impl Order {
    pub fn new(
        ticket: i64,
        kind: OrderKind,
        side: Side,
        symbol: impl Into<String>,
        magic: i64,
        open_price: Decimal,
        volume: Decimal,
        cycle_id: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            ticket,
            kind,
            side,
            symbol: symbol.into(),
            magic,
            open_price,
            volume,
            sl: None,
            tp: None,
            trailing_steps: 0,
            swap: Decimal::ZERO,
            commission: Decimal::ZERO,
            profit: Decimal::ZERO,
            is_pending: matches!(kind, OrderKind::Pending),
            is_closed: false,
            cycle_id: cycle_id.into(),
            account_id: account_id.into(),
            verification: VerificationState::Open,
        }
    }

    /// Reads this ticket's current broker state and updates profit, SL,
    /// TP, volume and the pending/closed flags. Never flips `is_closed`
    /// to true on a single absent read — that commitment is gated behind
    /// [`Self::check_false_closed_cycle`]'s double verification.
    pub async fn refresh_from_broker(
        &mut self,
        gateway: &dyn BrokerGateway,
    ) -> Result<RefreshOutcome, ExecutionError> {
        if let Some(position) = gateway.position_by_ticket(self.ticket).await? {
            self.verification = VerificationState::Open;
            let changed = self.volume != position.volume
                || self.sl != position.sl
                || self.tp != position.tp
                || self.profit != position.profit
                || self.swap != position.swap
                || self.commission != position.commission
                || self.is_pending;
            self.volume = position.volume;
            self.sl = position.sl;
            self.tp = position.tp;
            self.profit = position.profit;
            self.swap = position.swap;
            self.commission = position.commission;
            self.is_pending = false;
            return Ok(if changed { RefreshOutcome::Updated } else { RefreshOutcome::Unchanged });
        }

        if let Some(pending) = gateway.order_by_ticket(self.ticket).await? {
            self.verification = VerificationState::Open;
            let changed = self.volume != pending.volume
                || self.sl != pending.sl
                || self.tp != pending.tp
                || !self.is_pending;
            self.volume = pending.volume;
            self.sl = pending.sl;
            self.tp = pending.tp;
            self.is_pending = true;
            return Ok(if changed { RefreshOutcome::Updated } else { RefreshOutcome::Unchanged });
        }

        self.verification = VerificationState::Candidate;
        Ok(RefreshOutcome::CandidateClosed)
    }

    /// True once [`Self::refresh_from_broker`] has observed this ticket
    /// absent from the broker at least once, but before the closure has
    /// been committed.
    pub fn is_candidate_closed(&self) -> bool {
        matches!(self.verification, VerificationState::Candidate)
    }

    /// Confirms a suspected closure with a second broker read after
    /// `verification_delay`, and only then marks the order closed. Used
    /// both by routine per-tick cycle management and by reconciliation's
    /// suspicious-order pass; either caller may commit the same ticket's
    /// closure without conflict since the check is idempotent once
    /// `is_closed` is already true.
    pub async fn check_false_closed_cycle(
        &mut self,
        gateway: &dyn BrokerGateway,
        verification_delay: Duration,
    ) -> Result<bool, ExecutionError> {
        if self.is_closed {
            return Ok(false);
        }
        if !gateway.check_is_closed(self.ticket).await? {
            self.verification = VerificationState::Open;
            return Ok(false);
        }
        tokio::time::sleep(verification_delay).await;
        if !gateway.check_is_closed(self.ticket).await? {
            self.verification = VerificationState::Open;
            return Ok(false);
        }
        self.is_closed = true;
        self.is_pending = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_gateway::MockGateway;
    use gridloop_markets::{SlTpUnit, SymbolInfo};
    use rust_decimal_macros::dec;

    fn symbol_info() -> SymbolInfo {
        SymbolInfo {
            point: dec!(0.00001),
            spread: dec!(0.00002),
            bid: dec!(1.10000),
            ask: dec!(1.10002),
        }
    }

    #[tokio::test]
    async fn refresh_picks_up_profit_changes_from_an_open_position() {
        let gateway = MockGateway::new();
        gateway.set_symbol("EURUSD", symbol_info());
        let positions = gateway
            .market(Side::Buy, "EURUSD", dec!(0.01), 1, dec!(0), dec!(0), SlTpUnit::Pips, 5, "c")
            .await
            .unwrap();
        let ticket = positions[0].ticket;

        let mut order = Order::new(
            ticket,
            OrderKind::Market,
            Side::Buy,
            "EURUSD",
            1,
            dec!(1.10002),
            dec!(0.01),
            "cycle-1",
            "account-1",
        );

        let outcome = order.refresh_from_broker(&gateway).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert!(!order.is_pending);
        assert!(!order.is_closed);
    }

    #[tokio::test]
    async fn absent_ticket_is_only_a_candidate_until_double_verified() {
        let gateway = MockGateway::new();
        let mut order = Order::new(
            999,
            OrderKind::Market,
            Side::Buy,
            "EURUSD",
            1,
            dec!(1.1),
            dec!(0.01),
            "cycle-1",
            "account-1",
        );

        let outcome = order.refresh_from_broker(&gateway).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::CandidateClosed);
        assert!(order.is_candidate_closed());
        assert!(!order.is_closed);

        let committed = order
            .check_false_closed_cycle(&gateway, Duration::from_millis(1))
            .await
            .unwrap();
        assert!(!committed, "broker check_is_closed still false without history entry");

        gateway.seed_history(999);
        let committed = order
            .check_false_closed_cycle(&gateway, Duration::from_millis(1))
            .await
            .unwrap();
        assert!(committed);
        assert!(order.is_closed);
    }

    #[tokio::test]
    async fn already_closed_order_short_circuits_false_closed_check() {
        let gateway = MockGateway::new();
        let mut order = Order::new(
            1,
            OrderKind::Market,
            Side::Buy,
            "EURUSD",
            1,
            dec!(1.1),
            dec!(0.01),
            "cycle-1",
            "account-1",
        );
        order.is_closed = true;

        let committed = order
            .check_false_closed_cycle(&gateway, Duration::from_millis(1))
            .await
            .unwrap();
        assert!(!committed);
    }
}
