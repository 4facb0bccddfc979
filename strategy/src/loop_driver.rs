//! The per-bot Strategy Loop (§4.6): periodic tick driving every active
//! cycle, autotrade gating, candle-close trading, and the user-event
//! router (`handle_event`).

use crate::event::StrategyEvent;
use crate::gating::may_open_new_cycle;
use crate::repository::{BotRepository, RemoteCyclePublisher};
use crate::StrategyError;
use chrono::{DateTime, Utc};
use gridloop_engine::{open_candle_close_cycle, Cycle, CycleRepository};
use gridloop_execution::OrderRepository;
use gridloop_gateway::BrokerGateway;
use gridloop_markets::{CycleKind, OpenedBy, Side, SlTpUnit};
use gridloop_risk::{CheckMaxCycles, RiskCheck};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What happened during one [`StrategyLoop::tick_once`] call, for logging
/// and assertions in tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub cycles_managed: usize,
    pub opened_new_cycle: Option<String>,
    pub opened_candle_cycle: Option<String>,
}

struct LoopState {
    last_cycle_price: Option<Decimal>,
    last_candle_open: Option<DateTime<Utc>>,
    next_seq: u64,
}

/// One driver per bot (§4.6). Owns no cycle state itself — everything is
/// read from and written back to [`CycleRepository`]/[`OrderRepository`]
/// each tick, so a restart picks up exactly where the local store left
/// off.
pub struct StrategyLoop {
    pub bot_id: String,
    pub account_id: String,
    pub symbol: String,
    pub magic: i64,
    gateway: Arc<dyn BrokerGateway>,
    cycles: Arc<dyn CycleRepository>,
    orders: Arc<dyn OrderRepository>,
    bots: Arc<dyn BotRepository>,
    remote: Option<Arc<dyn RemoteCyclePublisher>>,
    state: Mutex<LoopState>,
}

impl StrategyLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bot_id: impl Into<String>,
        account_id: impl Into<String>,
        symbol: impl Into<String>,
        magic: i64,
        gateway: Arc<dyn BrokerGateway>,
        cycles: Arc<dyn CycleRepository>,
        orders: Arc<dyn OrderRepository>,
        bots: Arc<dyn BotRepository>,
        remote: Option<Arc<dyn RemoteCyclePublisher>>,
    ) -> Self {
        Self {
            bot_id: bot_id.into(),
            account_id: account_id.into(),
            symbol: symbol.into(),
            magic,
            gateway,
            cycles,
            orders,
            bots,
            remote,
            state: Mutex::new(LoopState {
                last_cycle_price: None,
                last_candle_open: None,
                next_seq: 0,
            }),
        }
    }

    async fn fetch_bot(&self) -> Result<gridloop_markets::Bot, StrategyError> {
        self.bots
            .by_id(&self.bot_id)
            .await?
            .ok_or_else(|| StrategyError::UnknownBot(self.bot_id.clone()))
    }

    fn next_cycle_id(&self) -> String {
        let mut state = self.state.lock().expect("strategy loop state mutex poisoned");
        state.next_seq += 1;
        format!("{}-cycle-{}", self.bot_id, state.next_seq)
    }

    async fn persist_cycle(&self, cycle: &Cycle) -> Result<(), StrategyError> {
        self.cycles.save(cycle).await?;
        if let Some(remote) = &self.remote {
            if let Err(error) = remote.publish_cycle(cycle).await {
                tracing::warn!(cycle = %cycle.id, %error, "remote cycle publish failed, will retry next tick");
            }
        }
        Ok(())
    }

    /// Runs exactly one pass of the §4.6 loop body: manage + persist every
    /// active cycle, maybe open a new one under autotrade gating, maybe
    /// fire candle-close trading. Does not sleep — callers drive the 1s
    /// cadence via [`Self::run`].
    pub async fn tick_once(&self, now: DateTime<Utc>) -> Result<TickSummary, StrategyError> {
        let mut summary = TickSummary::default();
        let bot = self.fetch_bot().await?;

        let Some(info) = self.gateway.symbol_info(&self.symbol).await? else {
            return Ok(summary);
        };
        let pip = info.pip();
        let price = info.bid;

        let mut active = self.cycles.active_cycles(&self.bot_id).await?;

        if !bot.is_stopped() {
            for cycle in active.iter_mut() {
                cycle
                    .manage_tick(&*self.gateway, &*self.orders, &bot.config, pip, price, now)
                    .await?;
                summary.cycles_managed += 1;
                self.persist_cycle(cycle).await?;
            }
        }

        if !bot.is_stopped() {
            let last_cycle_price = {
                let mut state = self.state.lock().expect("poisoned");
                *state.last_cycle_price.get_or_insert(info.ask)
            };
            let up_price = last_cycle_price + bot.config.autotrade_threshold_pips * pip;
            let down_price = last_cycle_price - bot.config.autotrade_threshold_pips * pip;
            let direction = if info.ask >= up_price {
                Some(Side::Buy)
            } else if info.bid <= down_price {
                Some(Side::Sell)
            } else {
                None
            };
            if let Some(direction) = direction {
                if may_open_new_cycle(&bot.config, &active, Some(last_cycle_price), price, direction, pip) {
                    if let Some(cycle) = self.open_market_cycle(&bot, direction, now).await? {
                        summary.opened_new_cycle = Some(cycle.id.clone());
                        active.push(cycle);
                    }
                }
                let mut state = self.state.lock().expect("poisoned");
                state.last_cycle_price = Some(if info.ask >= up_price {
                    info.ask
                } else if info.bid <= down_price {
                    info.bid
                } else {
                    last_cycle_price
                });
            }
        }

        if bot.config.auto_candle_close && !bot.is_stopped() {
            if let Some(candle) = self
                .gateway
                .last_candle(&self.symbol, bot.config.candle_timeframe)
                .await?
            {
                let is_new = {
                    let state = self.state.lock().expect("poisoned");
                    state.last_candle_open.is_none_or(|last| candle.open_time > last)
                };
                if is_new {
                    if let Some(direction) = candle.direction() {
                        // Candle-close trading opens a new cycle same as the
                        // autotrade-threshold path, so it is capped by the
                        // same `max_cycles` ceiling (§4.5.4/§9).
                        if CheckMaxCycles::new(bot.config.max_cycles).check(&active.len()).is_ok() {
                            let id = self.next_cycle_id();
                            if let Some(cycle) = open_candle_close_cycle(
                                &*self.gateway,
                                id,
                                &self.bot_id,
                                &self.account_id,
                                &self.symbol,
                                self.magic,
                                direction,
                                pip,
                                &bot.config,
                            )
                            .await?
                            {
                                summary.opened_candle_cycle = Some(cycle.id.clone());
                                self.persist_cycle(&cycle).await?;
                            }
                        }
                    }
                    let mut state = self.state.lock().expect("poisoned");
                    state.last_candle_open = Some(candle.open_time);
                }
            }
        }

        Ok(summary)
    }

    async fn open_market_cycle(
        &self,
        bot: &gridloop_markets::Bot,
        side: Side,
        _now: DateTime<Utc>,
    ) -> Result<Option<Cycle>, StrategyError> {
        let positions = match self
            .gateway
            .market(
                side,
                &self.symbol,
                bot.config.lot_size,
                self.magic,
                Decimal::ZERO,
                Decimal::ZERO,
                SlTpUnit::Pips,
                bot.config.slippage,
                "autotrade",
            )
            .await
        {
            Ok(positions) => positions,
            Err(error) => {
                tracing::warn!(%error, "autotrade market order rejected by broker");
                return Ok(None);
            }
        };
        let Some(entry) = positions.into_iter().next() else {
            return Ok(None);
        };
        let kind = match side {
            Side::Buy => CycleKind::Buy,
            Side::Sell => CycleKind::Sell,
        };
        let cycle = Cycle::open(
            self.next_cycle_id(),
            &self.bot_id,
            &self.account_id,
            &self.symbol,
            self.magic,
            kind,
            side,
            entry.open_price,
            entry.ticket,
            entry.volume,
            bot_pip_or(bot, &self.gateway).await,
            bot.config.zone_pips,
            bot.config.zone_forward2_pips,
            OpenedBy::engine(),
        );
        self.persist_cycle(&cycle).await?;
        Ok(Some(cycle))
    }

    /// Runs [`Self::tick_once`] every second until `shutdown` fires
    /// (§5: "children are expected to exit at their next suspension
    /// point"). Any per-tick error is logged and the loop continues —
    /// no exception escapes the loop body (§7 propagation policy).
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!(bot = %self.bot_id, "strategy loop shutting down");
                        return;
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    if let Err(error) = self.tick_once(Utc::now()).await {
                        tracing::error!(bot = %self.bot_id, %error, "strategy loop tick failed");
                    }
                }
            }
        }
    }

    /// Dispatches one user event (§4.6 table) against this bot's cycles.
    pub async fn handle_event(&self, event: StrategyEvent) -> Result<(), StrategyError> {
        match event {
            StrategyEvent::OpenOrder { price, side, .. } => self.handle_open_order(side, price).await,
            StrategyEvent::CloseCycle { id, .. } if id == "all" => self.close_all_cycles().await,
            StrategyEvent::CloseCycle { id, .. } => self.close_one_cycle(&id).await,
            StrategyEvent::CloseAllCycles { .. } => self.close_all_cycles().await,
            StrategyEvent::CloseOrder { ticket, .. } => self.close_one_ticket(ticket).await,
            StrategyEvent::ClosePendingOrder { ticket, .. } => self.close_one_ticket(ticket).await,
            StrategyEvent::CloseAllPendingOrders { .. } => self.close_all_pending_orders().await,
            StrategyEvent::UpdateOrderConfigs {
                ticket, sl, tp, trailing_steps, ..
            } => self.update_order_configs(ticket, sl, tp, trailing_steps).await,
            StrategyEvent::StopBot { .. } => self.set_stopped(true).await,
            StrategyEvent::StartBot { .. } => self.set_stopped(false).await,
        }
    }

    async fn handle_open_order(&self, side: CycleKind, price: Decimal) -> Result<(), StrategyError> {
        let bot = self.fetch_bot().await?;
        let Some(ask) = self.gateway.ask(&self.symbol).await? else {
            return Ok(());
        };
        let legs: &[Side] = match side {
            CycleKind::Buy => &[Side::Buy],
            CycleKind::Sell => &[Side::Sell],
            CycleKind::BuyAndSell => &[Side::Buy, Side::Sell],
        };
        for &leg in legs {
            let cycle = if price.is_zero() {
                self.open_market_cycle(&bot, leg, Utc::now()).await?
            } else {
                self.open_pending_cycle(&bot, leg, price, ask).await?
            };
            if cycle.is_none() {
                tracing::warn!(side = %leg, "open_order leg rejected by broker");
            }
        }
        Ok(())
    }

    async fn open_pending_cycle(
        &self,
        bot: &gridloop_markets::Bot,
        side: Side,
        price: Decimal,
        ask: Decimal,
    ) -> Result<Option<Cycle>, StrategyError> {
        // Buy stop above ask / buy limit below ask, mirrored for sell (§4.6).
        // `BrokerGateway::pending` takes one price and no stop/limit kind
        // (§4.1's contract), so the classification can't change what gets
        // submitted — it's carried in the comment for the broker's fill
        // report and terminal logs.
        let comment = match side {
            Side::Buy if price > ask => "manual_open_buy_stop",
            Side::Buy => "manual_open_buy_limit",
            Side::Sell if price < ask => "manual_open_sell_stop",
            Side::Sell => "manual_open_sell_limit",
        };
        let orders = match self
            .gateway
            .pending(
                side,
                &self.symbol,
                price,
                bot.config.lot_size,
                self.magic,
                Decimal::ZERO,
                Decimal::ZERO,
                SlTpUnit::Pips,
                bot.config.slippage,
                comment,
            )
            .await
        {
            Ok(orders) => orders,
            Err(error) => {
                tracing::warn!(%error, "pending open_order rejected by broker");
                return Ok(None);
            }
        };
        let Some(entry) = orders.into_iter().next() else {
            return Ok(None);
        };
        let info = self
            .gateway
            .symbol_info(&self.symbol)
            .await?
            .ok_or_else(|| gridloop_gateway::GatewayError::SymbolUnknown(self.symbol.clone()))?;
        let kind = match side {
            Side::Buy => CycleKind::Buy,
            Side::Sell => CycleKind::Sell,
        };
        let mut cycle = Cycle::open(
            self.next_cycle_id(),
            &self.bot_id,
            &self.account_id,
            &self.symbol,
            self.magic,
            kind,
            side,
            entry.price,
            entry.ticket,
            entry.volume,
            info.pip(),
            bot.config.zone_pips,
            bot.config.zone_forward2_pips,
            OpenedBy::engine(),
        );
        cycle.is_pending = true;
        self.persist_cycle(&cycle).await?;
        Ok(Some(cycle))
    }

    /// Closes every active cycle on this bot. Exposed publicly so a future
    /// operator-facing tool (outside this crate's scope) can call it
    /// directly rather than going through the event router.
    pub async fn close_all_cycles(&self) -> Result<(), StrategyError> {
        let mut active = self.cycles.active_cycles(&self.bot_id).await?;
        for cycle in active.iter_mut() {
            cycle
                .close_all(&*self.gateway, &*self.orders, "close_all_cycles event", Utc::now())
                .await?;
            self.persist_cycle(cycle).await?;
        }
        Ok(())
    }

    async fn close_one_cycle(&self, id: &str) -> Result<(), StrategyError> {
        let mut cycle = self
            .cycles
            .by_id(id)
            .await?
            .ok_or_else(|| StrategyError::CycleNotFound(id.to_string()))?;
        cycle
            .close_all(&*self.gateway, &*self.orders, "close_cycle event", Utc::now())
            .await?;
        self.persist_cycle(&cycle).await?;
        Ok(())
    }

    async fn close_one_ticket(&self, ticket: i64) -> Result<(), StrategyError> {
        let mut active = self.cycles.active_cycles(&self.bot_id).await?;
        let Some(cycle) = active.iter_mut().find(|c| c.active_orders.contains(&ticket)) else {
            return Err(StrategyError::TicketNotOwned(ticket));
        };
        cycle.close_ticket(ticket, &*self.gateway, &*self.orders).await?;
        self.persist_cycle(cycle).await?;
        Ok(())
    }

    async fn close_all_pending_orders(&self) -> Result<(), StrategyError> {
        let mut active = self.cycles.active_cycles(&self.bot_id).await?;
        for cycle in active.iter_mut() {
            let pending: Vec<i64> = cycle.pending.clone();
            for ticket in pending {
                cycle.close_ticket(ticket, &*self.gateway, &*self.orders).await?;
            }
            self.persist_cycle(cycle).await?;
        }
        Ok(())
    }

    async fn update_order_configs(
        &self,
        ticket: i64,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
        trailing_steps: Option<i32>,
    ) -> Result<(), StrategyError> {
        let Some(mut order) = self.orders.by_ticket(ticket).await? else {
            return Err(StrategyError::TicketNotOwned(ticket));
        };
        if let Some(sl) = sl {
            order.sl = Some(sl);
        }
        if let Some(tp) = tp {
            order.tp = Some(tp);
        }
        if let Some(steps) = trailing_steps {
            order.trailing_steps = steps;
        }
        self.orders.save(&order).await?;
        Ok(())
    }

    async fn set_stopped(&self, stopped: bool) -> Result<(), StrategyError> {
        let mut bot = self.fetch_bot().await?;
        bot.runtime.stopped = stopped;
        self.bots.save(&bot).await?;
        Ok(())
    }
}

/// The symbol's pip size, used when opening an autotrade cycle (the zone
/// model anchors in pips, §4.5.1). `bot.config.zone_pips.signum()` above
/// is always `1` for a positive config; kept as a defensive no-op rather
/// than special-cased, since a misconfigured zero/negative zone would be
/// a configuration error (§7) the caller already logged.
async fn bot_pip_or(bot: &gridloop_markets::Bot, gateway: &Arc<dyn BrokerGateway>) -> Decimal {
    if let Ok(Some(info)) = gateway.symbol_info(&bot.symbol).await {
        return info.pip();
    }
    Decimal::new(1, 4)
}
