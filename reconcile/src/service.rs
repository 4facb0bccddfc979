//! Order Reconciliation (§4.7, component C7): a background task, one per
//! broker session, diffing broker positions against the Local Store's
//! "open" orders and flagging mismatches.

use crate::error::ReconcileError;
use chrono::Utc;
use gridloop_engine::{Cycle, CycleRepository};
use gridloop_execution::{Order, OrderRepository, RefreshOutcome};
use gridloop_gateway::BrokerGateway;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// What one [`ReconciliationService::tick`] pass did, for logging.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub refreshed: usize,
    pub closures_committed: Vec<i64>,
    pub cycles_reopened: Vec<String>,
}

/// Background diff of broker positions/orders against the Local Store's
/// notion of "open" (§4.7). One instance per broker session; the
/// `broker_mutex` ensures this task's broker reads never interleave with
/// a concurrent Strategy Loop tick against the same gateway.
pub struct ReconciliationService {
    gateway: Arc<dyn BrokerGateway>,
    orders: Arc<dyn OrderRepository>,
    cycles: Arc<dyn CycleRepository>,
    broker_mutex: Mutex<()>,
    bot_ids: Vec<String>,
    sync_delay: Duration,
}

impl ReconciliationService {
    pub fn new(
        gateway: Arc<dyn BrokerGateway>,
        orders: Arc<dyn OrderRepository>,
        cycles: Arc<dyn CycleRepository>,
        bot_ids: Vec<String>,
        sync_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            orders,
            cycles,
            broker_mutex: Mutex::new(()),
            bot_ids,
            sync_delay,
        }
    }

    /// Runs one reconciliation pass across every configured bot (§4.7
    /// items 1-4). Holds the broker mutex for the whole pass so a
    /// concurrent Strategy Loop tick cannot read the gateway mid-diff.
    pub async fn tick(&self) -> Result<ReconcileSummary, ReconcileError> {
        let _guard = self.broker_mutex.lock().await;
        let mut summary = ReconcileSummary::default();

        let active_tickets: HashSet<i64> = self
            .gateway
            .all_positions()
            .await?
            .into_iter()
            .map(|p| p.ticket)
            .chain(self.gateway.all_orders().await?.into_iter().map(|o| o.ticket))
            .collect();

        for bot_id in &self.bot_ids {
            let local_open = self.orders.open_orders_only(bot_id).await?;
            let (intersection, suspicious): (Vec<_>, Vec<_>) = local_open
                .into_iter()
                .partition(|order| active_tickets.contains(&order.ticket));

            // Step 3: the intersection first — refresh and persist.
            for mut order in intersection {
                let outcome = order.refresh_from_broker(self.gateway.as_ref()).await?;
                if !matches!(outcome, RefreshOutcome::Unchanged) {
                    self.orders.save(&order).await?;
                }
                summary.refreshed += 1;
                if order.is_candidate_closed() {
                    self.verify_and_commit(order, &mut summary).await?;
                }
            }

            tokio::time::sleep(self.sync_delay / 2).await;

            // Step 4: suspicious orders — absent from the broker's active
            // set, so drive the two-phase verification directly.
            for order in suspicious {
                self.verify_and_commit(order, &mut summary).await?;
            }
        }

        Ok(summary)
    }

    /// Alias for [`Self::tick`] under the name a future operator-facing
    /// tool (outside this crate's scope) would call to force an
    /// out-of-band reconciliation pass.
    pub async fn force_sync_once(&self) -> Result<ReconcileSummary, ReconcileError> {
        self.tick().await
    }

    /// Read-only diagnostic: which locally-open tickets are currently
    /// absent from the broker's active set, without driving the
    /// two-phase verification or mutating any state. For a future
    /// operator-facing tool to surface before deciding to force a sync.
    pub async fn report_suspicious(&self) -> Result<Vec<i64>, ReconcileError> {
        let _guard = self.broker_mutex.lock().await;
        let active_tickets: HashSet<i64> = self
            .gateway
            .all_positions()
            .await?
            .into_iter()
            .map(|p| p.ticket)
            .chain(self.gateway.all_orders().await?.into_iter().map(|o| o.ticket))
            .collect();

        let mut suspicious = Vec::new();
        for bot_id in &self.bot_ids {
            let local_open = self.orders.open_orders_only(bot_id).await?;
            suspicious.extend(
                local_open
                    .into_iter()
                    .filter(|order| !active_tickets.contains(&order.ticket))
                    .map(|order| order.ticket),
            );
        }
        Ok(suspicious)
    }

    async fn verify_and_commit(
        &self,
        mut order: Order,
        summary: &mut ReconcileSummary,
    ) -> Result<(), ReconcileError> {
        let committed = order
            .check_false_closed_cycle(self.gateway.as_ref(), self.sync_delay / 2)
            .await?;
        if !committed {
            self.orders.save(&order).await?;
            return Ok(());
        }
        self.orders.save(&order).await?;
        summary.closures_committed.push(order.ticket);
        if let Some(reopened) = self.revisit_cycle(&order).await? {
            summary.cycles_reopened.push(reopened);
        }
        Ok(())
    }

    /// Folds a newly-committed closure into its owning cycle, and — if
    /// the cycle was already fully closed yet the broker now shows
    /// active positions under the same magic number — reopens it with
    /// the newly discovered tickets (§4.4 `CheckFalseClosedCycle`).
    async fn revisit_cycle(&self, order: &Order) -> Result<Option<String>, ReconcileError> {
        let Some(mut cycle) = self.cycles.by_id(&order.cycle_id).await? else {
            return Ok(None);
        };

        remove_from_active_sets(&mut cycle, order.ticket);
        cycle.total_profit += order.profit;
        if order.profit.is_sign_negative() {
            cycle.accumulated_loss += order.profit;
        }

        if !cycle.is_closed && cycle.active_orders.is_empty() && cycle.pending.is_empty() {
            cycle.mark_closed("reconciliation", "all tracked orders closed", Utc::now());
            self.cycles.save(&cycle).await?;
            return Ok(None);
        }

        if cycle.is_closed {
            let known: HashSet<i64> = known_tickets(&cycle);
            let rediscovered: Vec<i64> = self
                .gateway
                .all_positions()
                .await?
                .into_iter()
                .filter(|p| p.magic == cycle.magic && !known.contains(&p.ticket))
                .map(|p| p.ticket)
                .collect();
            if !rediscovered.is_empty() {
                cycle.active_orders.extend(rediscovered);
                cycle.is_closed = false;
                cycle.is_pending = false;
                cycle.status = gridloop_markets::CycleStatus::Active;
                cycle.closing_method = None;
                cycle.close_reason = None;
                cycle.close_time = None;
                self.cycles.save(&cycle).await?;
                return Ok(Some(cycle.id));
            }
        }

        self.cycles.save(&cycle).await?;
        Ok(None)
    }

    /// Runs [`Self::tick`] every ~1s until `shutdown` fires, sleeping 5s
    /// before resuming after any error (§4.7 "On any exception, the loop
    /// sleeps 5s before resuming").
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    if let Err(error) = self.tick().await {
                        tracing::warn!(%error, "reconciliation tick failed, backing off");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }
}

fn remove_from_active_sets(cycle: &mut Cycle, ticket: i64) {
    for set in [
        &mut cycle.initial,
        &mut cycle.hedge,
        &mut cycle.pending,
        &mut cycle.recovery,
        &mut cycle.threshold,
        &mut cycle.active_orders,
    ] {
        set.retain(|t| *t != ticket);
    }
    if !cycle.closed.contains(&ticket) {
        cycle.closed.push(ticket);
    }
    cycle.completed_orders.push(ticket);
}

fn known_tickets(cycle: &Cycle) -> HashSet<i64> {
    cycle
        .initial
        .iter()
        .chain(cycle.hedge.iter())
        .chain(cycle.pending.iter())
        .chain(cycle.recovery.iter())
        .chain(cycle.threshold.iter())
        .chain(cycle.active_orders.iter())
        .chain(cycle.closed.iter())
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gridloop_engine::EngineError;
    use gridloop_execution::ExecutionError;
    use gridloop_gateway::MockGateway;
    use gridloop_markets::{CycleKind, OpenedBy, OrderKind, Position, Side};
    use parking_lot::Mutex as SyncMutex;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryOrders(SyncMutex<HashMap<i64, Order>>);

    #[async_trait]
    impl OrderRepository for InMemoryOrders {
        async fn save(&self, order: &Order) -> Result<(), ExecutionError> {
            self.0.lock().insert(order.ticket, order.clone());
            Ok(())
        }
        async fn by_ticket(&self, ticket: i64) -> Result<Option<Order>, ExecutionError> {
            Ok(self.0.lock().get(&ticket).cloned())
        }
        async fn by_cycle(&self, cycle_id: &str) -> Result<Vec<Order>, ExecutionError> {
            Ok(self.0.lock().values().filter(|o| o.cycle_id == cycle_id).cloned().collect())
        }
        async fn open_orders_only(&self, _bot_id: &str) -> Result<Vec<Order>, ExecutionError> {
            Ok(self.0.lock().values().filter(|o| !o.is_closed).cloned().collect())
        }
    }

    #[derive(Default)]
    struct InMemoryCycles(SyncMutex<HashMap<String, Cycle>>);

    #[async_trait]
    impl CycleRepository for InMemoryCycles {
        async fn save(&self, cycle: &Cycle) -> Result<(), EngineError> {
            self.0.lock().insert(cycle.id.clone(), cycle.clone());
            Ok(())
        }
        async fn by_id(&self, id: &str) -> Result<Option<Cycle>, EngineError> {
            Ok(self.0.lock().get(id).cloned())
        }
        async fn active_cycles(&self, bot_id: &str) -> Result<Vec<Cycle>, EngineError> {
            Ok(self.0.lock().values().filter(|c| c.bot_id == bot_id && !c.is_closed).cloned().collect())
        }
    }

    fn sample_cycle(id: &str) -> Cycle {
        Cycle::open(
            id,
            "bot-1",
            "acct-1",
            "EURUSD",
            1,
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

    #[tokio::test]
    async fn suspicious_order_is_committed_closed_after_double_verification() {
        let gateway = Arc::new(MockGateway::new());
        let orders: Arc<dyn OrderRepository> = Arc::new(InMemoryOrders::default());
        let cycles: Arc<dyn CycleRepository> = Arc::new(InMemoryCycles::default());

        let mut cycle = sample_cycle("c-1");
        cycle.active_orders = vec![1];
        cycles.save(&cycle).await.unwrap();

        let order = Order::new(1, OrderKind::Market, Side::Buy, "EURUSD", 1, dec!(1.1), dec!(0.01), "c-1", "acct-1");
        orders.save(&order).await.unwrap();

        gateway.seed_history(1);

        let service = ReconciliationService::new(
            gateway.clone(),
            orders.clone(),
            cycles.clone(),
            vec!["bot-1".to_string()],
            Duration::from_millis(2),
        );

        let summary = service.tick().await.unwrap();
        assert_eq!(summary.closures_committed, vec![1]);

        let fetched_order = orders.by_ticket(1).await.unwrap().unwrap();
        assert!(fetched_order.is_closed);

        let fetched_cycle = cycles.by_id("c-1").await.unwrap().unwrap();
        assert!(fetched_cycle.is_closed);
        assert_eq!(fetched_cycle.closed, vec![1]);
    }

    #[tokio::test]
    async fn intersection_order_is_refreshed_without_closing() {
        let gateway = Arc::new(MockGateway::new());
        let orders: Arc<dyn OrderRepository> = Arc::new(InMemoryOrders::default());
        let cycles: Arc<dyn CycleRepository> = Arc::new(InMemoryCycles::default());

        let mut cycle = sample_cycle("c-1");
        cycle.active_orders = vec![1];
        cycles.save(&cycle).await.unwrap();

        gateway.seed_position(Position {
            ticket: 1,
            magic: 1,
            side: Side::Buy,
            volume: dec!(0.01),
            open_price: dec!(1.1),
            sl: None,
            tp: None,
            swap: dec!(0),
            commission: dec!(0),
            profit: dec!(5),
        });
        let order = Order::new(1, OrderKind::Market, Side::Buy, "EURUSD", 1, dec!(1.1), dec!(0.01), "c-1", "acct-1");
        orders.save(&order).await.unwrap();

        let service = ReconciliationService::new(
            gateway.clone(),
            orders.clone(),
            cycles.clone(),
            vec!["bot-1".to_string()],
            Duration::from_millis(2),
        );

        let summary = service.tick().await.unwrap();
        assert!(summary.closures_committed.is_empty());

        let fetched_order = orders.by_ticket(1).await.unwrap().unwrap();
        assert!(!fetched_order.is_closed);
        assert_eq!(fetched_order.profit, dec!(5));
    }

    #[tokio::test]
    async fn closed_cycle_reopens_when_broker_shows_a_matching_new_position() {
        let gateway = Arc::new(MockGateway::new());
        let orders: Arc<dyn OrderRepository> = Arc::new(InMemoryOrders::default());
        let cycles: Arc<dyn CycleRepository> = Arc::new(InMemoryCycles::default());

        let mut cycle = sample_cycle("c-1");
        cycle.active_orders = vec![1];
        cycles.save(&cycle).await.unwrap();

        let order = Order::new(1, OrderKind::Market, Side::Buy, "EURUSD", 1, dec!(1.1), dec!(0.01), "c-1", "acct-1");
        orders.save(&order).await.unwrap();
        gateway.seed_history(1);

        // A new position under the same magic appears before the tick runs.
        gateway.seed_position(Position {
            ticket: 2,
            magic: 1,
            side: Side::Buy,
            volume: dec!(0.01),
            open_price: dec!(1.1),
            sl: None,
            tp: None,
            swap: dec!(0),
            commission: dec!(0),
            profit: dec!(0),
        });

        let service = ReconciliationService::new(
            gateway.clone(),
            orders.clone(),
            cycles.clone(),
            vec!["bot-1".to_string()],
            Duration::from_millis(2),
        );

        let summary = service.tick().await.unwrap();
        assert_eq!(summary.cycles_reopened, vec!["c-1".to_string()]);

        let fetched_cycle = cycles.by_id("c-1").await.unwrap().unwrap();
        assert!(!fetched_cycle.is_closed);
        assert!(fetched_cycle.active_orders.contains(&2));
    }
}
