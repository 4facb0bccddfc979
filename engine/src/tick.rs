//! Per-tick cycle management: refresh, grid step, reversal, hedge /
//! recovery, batch stop-loss, take-profit, in that order every tick.

use crate::cycle::Cycle;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use gridloop_execution::{OrderRepository, RefreshOutcome};
use gridloop_gateway::BrokerGateway;
use gridloop_markets::{CycleStatus, SlTpUnit, SltpKind, StrategyConfig};
use rust_decimal::Decimal;

/// What happened during one [`Cycle::manage_tick`] call, for logging and
/// assertions in tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub orders_closed: Vec<i64>,
    pub grid_step_opened: Option<i64>,
    pub reversed: bool,
    pub hedge_opened: Option<i64>,
    pub entered_recovery: bool,
    pub batch_stopped: bool,
    pub took_profit: bool,
}

impl Cycle {
    fn next_lot(&self, config: &StrategyConfig) -> Decimal {
        config
            .lot_sequence
            .get(self.lot_idx)
            .copied()
            .unwrap_or(config.lot_size)
    }

    /// Closes a single tracked ticket (market close for an open position,
    /// cancel for a resting pending order) and folds its realized profit
    /// out of the active set. Exposed publicly so the Strategy Loop's
    /// `close_order`/`close_pending_order` events (§4.6) can target one
    /// ticket without closing the whole cycle.
    pub async fn close_ticket(
        &mut self,
        ticket: i64,
        gateway: &dyn BrokerGateway,
        order_store: &dyn OrderRepository,
    ) -> Result<Decimal, EngineError> {
        let mut order = order_store
            .by_ticket(ticket)
            .await?
            .ok_or(EngineError::OrderMissing(ticket))?;
        if order.is_pending {
            gateway.close_order(ticket).await?;
        } else {
            gateway.close_position(ticket, 0).await?;
        }
        order.is_closed = true;
        order.is_pending = false;
        let profit = order.profit;
        order_store.save(&order).await?;
        self.move_to_closed(ticket);
        Ok(profit)
    }

    /// Runs the full per-tick management pass described for a single
    /// unclosed cycle: refreshes every tracked ticket, then evaluates
    /// grid step, reversal, hedge/recovery, batch stop-loss and
    /// take-profit in that order. Candle-close trading opens a *new*
    /// cycle and is therefore driven separately at the strategy-loop
    /// level, not from here.
    pub async fn manage_tick(
        &mut self,
        gateway: &dyn BrokerGateway,
        orders: &dyn OrderRepository,
        config: &StrategyConfig,
        pip: Decimal,
        current_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, EngineError> {
        let mut outcome = TickOutcome::default();
        if self.is_closed {
            return Ok(outcome);
        }

        // 1. Refresh every tracked ticket.
        for ticket in self.active_orders.clone() {
            let Some(mut order) = orders.by_ticket(ticket).await? else {
                continue;
            };
            match order.refresh_from_broker(gateway).await? {
                RefreshOutcome::Unchanged => {}
                RefreshOutcome::Updated => {
                    orders.save(&order).await?;
                }
                RefreshOutcome::CandidateClosed => {
                    order.is_closed = true;
                    orders.save(&order).await?;
                    self.move_to_closed(ticket);
                    outcome.orders_closed.push(ticket);
                    self.total_profit += order.profit;
                    if order.profit.is_sign_negative() {
                        self.accumulated_loss += order.profit;
                    }
                }
            }
        }

        // 2. Grid step.
        let required = config.pips_step * Decimal::from(self.next_order_index + 1) * pip;
        let moved = match self.current_direction {
            gridloop_markets::Side::Buy => current_price - self.initial_threshold_price,
            gridloop_markets::Side::Sell => self.initial_threshold_price - current_price,
        };
        if moved >= required {
            let half_pip = pip / Decimal::from(2);
            let already_done = self
                .done_price_levels
                .iter()
                .any(|level| (*level - current_price).abs() < half_pip);
            if !already_done {
                let lot = self.next_lot(config);
                match gateway
                    .market(
                        self.current_direction,
                        &self.symbol,
                        lot,
                        self.magic,
                        Decimal::ZERO,
                        Decimal::ZERO,
                        SlTpUnit::Pips,
                        config.slippage,
                        "grid_step",
                    )
                    .await
                {
                    Ok(positions) => {
                        outcome.grid_step_opened = positions.first().map(|p| p.ticket);
                        for position in positions {
                            self.threshold.push(position.ticket);
                            self.active_orders.push(position.ticket);
                            self.total_volume += position.volume;
                        }
                        self.done_price_levels.push(current_price);
                        self.next_order_index += 1;
                        self.status = CycleStatus::Active;
                    }
                    Err(error) => {
                        tracing::warn!(cycle = %self.id, %error, "grid step order rejected by broker");
                    }
                }
            }
        }

        // 3. Direction switch / reversal.
        let can_reverse = !self.direction_switched || config.unlimited_reversal;
        if can_reverse && self.pierces_opposite_threshold(current_price) {
            self.current_direction = self.current_direction.flipped();
            self.direction_switched = true;
            self.direction_switches += 1;
            self.initial_threshold_price = current_price;
            self.next_order_index = 0;
            let lot = self.next_lot(config);
            match gateway
                .market(
                    self.current_direction,
                    &self.symbol,
                    lot,
                    self.magic,
                    Decimal::ZERO,
                    Decimal::ZERO,
                    SlTpUnit::Pips,
                    config.slippage,
                    "reversal",
                )
                .await
            {
                Ok(positions) => {
                    for position in positions {
                        self.initial.push(position.ticket);
                        self.active_orders.push(position.ticket);
                        self.total_volume += position.volume;
                    }
                    self.status = CycleStatus::Active;
                    outcome.reversed = true;
                }
                Err(error) => {
                    tracing::warn!(cycle = %self.id, %error, "reversal order rejected by broker");
                }
            }
        }

        // 4. Hedging / recovery (opt-in).
        if config.hedge_enabled {
            if !self.hedge_fired && self.crosses_adverse_zone(current_price) {
                let hedge_side = self.current_direction.flipped();
                let lot = self.next_lot(config);
                match gateway
                    .market(
                        hedge_side,
                        &self.symbol,
                        lot,
                        self.magic,
                        config.hedge_sl_pips,
                        Decimal::ZERO,
                        SlTpUnit::Pips,
                        config.slippage,
                        "hedge",
                    )
                    .await
                {
                    Ok(positions) => {
                        outcome.hedge_opened = positions.first().map(|p| p.ticket);
                        for position in positions {
                            self.hedge.push(position.ticket);
                            self.active_orders.push(position.ticket);
                            self.total_volume += position.volume;
                        }
                        self.lot_idx += 1;
                        self.hedge_fired = true;
                        self.status = CycleStatus::Active;
                    }
                    Err(error) => {
                        tracing::warn!(cycle = %self.id, %error, "hedge order rejected by broker");
                    }
                }
            }

            if self.status != CycleStatus::Recovery
                && self.accumulated_loss.abs() >= config.recovery_loss_threshold
            {
                self.status = CycleStatus::Recovery;
                self.recovery_zone_base_price = Some(current_price);
                self.initial_stop_loss_price = Some(current_price);
                self.reanchor_zone(current_price, pip, config.zone_pips, config.zone_forward2_pips);
                outcome.entered_recovery = true;
            }
        }

        // 5. Batch stop-loss (Advanced family).
        if config.batch_stop_loss_enabled {
            let check = gridloop_risk::CheckBatchStopLoss::new(config.batch_stop_loss_pips);
            let input = gridloop_risk::BatchStopLossInput {
                pip,
                volume_sum: self.total_volume,
                batch_loss: self.accumulated_loss,
            };
            if check.check_against(&input).is_err() {
                for ticket in self.active_orders.clone() {
                    if let Ok(profit) = self.close_ticket(ticket, gateway, orders).await {
                        self.total_profit += profit;
                    }
                }
                self.batch_losses.push(self.accumulated_loss);
                self.accumulated_loss = Decimal::ZERO;
                self.next_order_index = 0;
                self.initial_threshold_price = current_price;
                self.done_price_levels.clear();
                outcome.batch_stopped = true;
            }
        }

        // 6. Take-profit.
        let take_profit_threshold = match config.sltp {
            SltpKind::Money => config.take_profit,
            SltpKind::Pips => config.take_profit * pip * self.total_volume.max(Decimal::ONE),
        };
        if !self.is_closed && take_profit_threshold > Decimal::ZERO && self.total_profit >= take_profit_threshold {
            for ticket in self.active_orders.clone() {
                if let Ok(profit) = self.close_ticket(ticket, gateway, orders).await {
                    self.total_profit += profit;
                }
            }
            self.mark_closed("take_profit", "total profit reached configured target", now);
            outcome.took_profit = true;
        }

        Ok(outcome)
    }

    /// Closes every remaining active ticket and marks the cycle closed,
    /// for the `close_cycle`/`close_all_cycles` user events.
    pub async fn close_all(
        &mut self,
        gateway: &dyn BrokerGateway,
        orders: &dyn OrderRepository,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if self.is_terminally_closed() {
            return Ok(());
        }
        for ticket in self.active_orders.clone() {
            if let Ok(profit) = self.close_ticket(ticket, gateway, orders).await {
                self.total_profit += profit;
            }
        }
        self.mark_closed("manual", reason, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gridloop_execution::{ExecutionError, Order};
    use gridloop_gateway::MockGateway;
    use gridloop_markets::{CycleKind, OpenedBy, OrderKind, Side, SymbolInfo};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryOrders {
        by_ticket: Mutex<HashMap<i64, Order>>,
    }

    impl InMemoryOrders {
        fn seed(&self, order: Order) {
            self.by_ticket.lock().insert(order.ticket, order);
        }
    }

    #[async_trait]
    impl OrderRepository for InMemoryOrders {
        async fn save(&self, order: &Order) -> Result<(), ExecutionError> {
            self.by_ticket.lock().insert(order.ticket, order.clone());
            Ok(())
        }

        async fn by_ticket(&self, ticket: i64) -> Result<Option<Order>, ExecutionError> {
            Ok(self.by_ticket.lock().get(&ticket).cloned())
        }

        async fn by_cycle(&self, cycle_id: &str) -> Result<Vec<Order>, ExecutionError> {
            Ok(self
                .by_ticket
                .lock()
                .values()
                .filter(|o| o.cycle_id == cycle_id)
                .cloned()
                .collect())
        }

        async fn open_orders_only(&self, _bot_id: &str) -> Result<Vec<Order>, ExecutionError> {
            Ok(self.by_ticket.lock().values().filter(|o| !o.is_closed).cloned().collect())
        }
    }

    fn symbol_info() -> SymbolInfo {
        SymbolInfo {
            point: dec!(0.00001),
            spread: dec!(0.00002),
            bid: dec!(1.10000),
            ask: dec!(1.10000),
        }
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            zone_pips: dec!(500),
            zone_forward2_pips: dec!(1),
            pips_step: dec!(100),
            lot_size: dec!(0.01),
            max_cycles: 1,
            sltp: SltpKind::Money,
            take_profit: dec!(5),
            ..StrategyConfig::default()
        }
    }

    async fn open_initial_cycle(gateway: &MockGateway, orders: &InMemoryOrders) -> Cycle {
        gateway.set_symbol("EURUSD", symbol_info());
        let positions = gateway
            .market(Side::Buy, "EURUSD", dec!(0.01), 1, dec!(0), dec!(0), SlTpUnit::Pips, 5, "open")
            .await
            .unwrap();
        let entry = positions[0];
        orders.seed(Order::new(
            entry.ticket,
            OrderKind::Market,
            Side::Buy,
            "EURUSD",
            1,
            entry.open_price,
            entry.volume,
            "cycle-1",
            "acct-1",
        ));
        Cycle::open(
            "cycle-1",
            "bot-1",
            "acct-1",
            "EURUSD",
            1,
            CycleKind::Buy,
            Side::Buy,
            entry.open_price,
            entry.ticket,
            entry.volume,
            dec!(0.0001),
            dec!(500),
            dec!(1),
            OpenedBy::engine(),
        )
    }

    #[tokio::test]
    async fn s1_buy_grid_step_fires_exactly_one_order_at_the_configured_distance() {
        let gateway = MockGateway::new();
        let orders = InMemoryOrders::default();
        let mut cycle = open_initial_cycle(&gateway, &orders).await;
        let config = config();

        // pips_step=100 at pip=0.0001 requires a 0.01 move, i.e. 1.11000.
        gateway.set_bid("EURUSD", dec!(1.11000));
        let outcome = cycle
            .manage_tick(&gateway, &orders, &config, dec!(0.0001), dec!(1.11000), chrono::Utc::now())
            .await
            .unwrap();

        assert!(outcome.grid_step_opened.is_some());
        assert_eq!(cycle.next_order_index, 1);
        assert_eq!(cycle.done_price_levels, vec![dec!(1.11000)]);
    }

    #[tokio::test]
    async fn s2_reversal_flips_direction_and_resets_the_grid_index() {
        let gateway = MockGateway::new();
        let orders = InMemoryOrders::default();
        let mut cycle = open_initial_cycle(&gateway, &orders).await;
        let config = config();

        gateway.set_bid("EURUSD", dec!(1.04990));
        let outcome = cycle
            .manage_tick(&gateway, &orders, &config, dec!(0.0001), dec!(1.04990), chrono::Utc::now())
            .await
            .unwrap();

        assert!(outcome.reversed);
        assert_eq!(cycle.current_direction, Side::Sell);
        assert_eq!(cycle.next_order_index, 0);
        assert!(cycle.direction_switched);
    }

    #[tokio::test]
    async fn s3_take_profit_in_money_closes_every_ticket_and_the_cycle() {
        let gateway = MockGateway::new();
        let orders = InMemoryOrders::default();
        let mut cycle = open_initial_cycle(&gateway, &orders).await;
        let config = config();

        let ticket = cycle.active_orders[0];
        gateway.seed_position(gridloop_gateway::Position {
            ticket,
            magic: 1,
            side: Side::Buy,
            volume: dec!(0.01),
            open_price: dec!(1.10000),
            sl: None,
            tp: None,
            swap: Decimal::ZERO,
            commission: Decimal::ZERO,
            profit: dec!(5.00),
        });

        let outcome = cycle
            .manage_tick(&gateway, &orders, &config, dec!(0.0001), dec!(1.10000), chrono::Utc::now())
            .await
            .unwrap();

        assert!(outcome.took_profit);
        assert!(cycle.is_terminally_closed());
        assert!(gateway.all_positions().await.unwrap().is_empty());
    }
}
