//! The Account Supervisor (§4.8, component C8): owns every bot on one
//! account and runs the four long-lived per-account tasks (metrics
//! publisher, event subscriber, token refresher, symbol price
//! publisher), plus bot lifecycle management
//! (`create_bot`/`update_bot`/`delete_bot`, §3 "Bot").

use crate::error::SupervisorError;
use crate::repository::{
    is_bot_lifecycle_message, AccountMetricsPublisher, BotDirectory, BotLifecycleContent, EventFeed, RemoteEvent,
    SymbolPricePublisher, TokenRefresher,
};
use gridloop_engine::CycleRepository;
use gridloop_execution::OrderRepository;
use gridloop_gateway::BrokerGateway;
use gridloop_integration::ProcessedEvents;
use gridloop_markets::{Account, AccountSnapshot, Bot, StrategyConfig, Symbol};
use gridloop_strategy::{BotRepository, EventContent, RemoteCyclePublisher, StrategyEvent, StrategyLoop};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One spawned bot's live handle: the driver itself (for dispatching
/// events), its dedicated shutdown channel, and the task running
/// [`StrategyLoop::run`].
struct BotHandle {
    strategy_loop: Arc<StrategyLoop>,
    symbol: String,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns all bots on one account (§4.8). Shares one [`BrokerGateway`], one
/// [`CycleRepository`]/[`OrderRepository`] pair and one optional
/// [`RemoteCyclePublisher`] across every bot it spawns, matching §5's
/// "one broker session" and "one local store connection pool" scoping.
pub struct AccountSupervisor {
    account_id: String,
    gateway: Arc<dyn BrokerGateway>,
    cycles: Arc<dyn CycleRepository>,
    orders: Arc<dyn OrderRepository>,
    bots_store: Arc<dyn BotRepository>,
    remote_publisher: Option<Arc<dyn RemoteCyclePublisher>>,
    directory: Arc<dyn BotDirectory>,
    event_feed: Arc<dyn EventFeed>,
    metrics: Arc<dyn AccountMetricsPublisher>,
    symbols: Arc<dyn SymbolPricePublisher>,
    token: Arc<dyn TokenRefresher>,
    loops: RwLock<HashMap<String, BotHandle>>,
    account: Mutex<Account>,
    symbol_ids: Mutex<HashMap<String, String>>,
    processed: Mutex<ProcessedEvents>,
    token_refresh_interval: Duration,
}

impl AccountSupervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account: Account,
        gateway: Arc<dyn BrokerGateway>,
        cycles: Arc<dyn CycleRepository>,
        orders: Arc<dyn OrderRepository>,
        bots_store: Arc<dyn BotRepository>,
        remote_publisher: Option<Arc<dyn RemoteCyclePublisher>>,
        directory: Arc<dyn BotDirectory>,
        event_feed: Arc<dyn EventFeed>,
        metrics: Arc<dyn AccountMetricsPublisher>,
        symbols: Arc<dyn SymbolPricePublisher>,
        token: Arc<dyn TokenRefresher>,
        token_refresh_interval: Duration,
    ) -> Self {
        Self {
            account_id: account.id.clone(),
            gateway,
            cycles,
            orders,
            bots_store,
            remote_publisher,
            directory,
            event_feed,
            metrics,
            symbols,
            token,
            loops: RwLock::new(HashMap::new()),
            account: Mutex::new(account),
            symbol_ids: Mutex::new(HashMap::new()),
            processed: Mutex::new(ProcessedEvents::new()),
            token_refresh_interval,
        }
    }

    /// §4.8 "Initialization": lists the account's bots from the remote
    /// store and spawns one [`StrategyLoop`] per bot.
    pub async fn init_bots(&self) -> Result<(), SupervisorError> {
        let bots = self.directory.list_bots(&self.account_id).await?;
        for bot in bots {
            self.spawn_bot_loop(bot).await;
        }
        Ok(())
    }

    /// Runs every long-lived task this account owns until `shutdown`
    /// fires, then stops every bot loop it spawned (§5 "the Supervisor
    /// cancels its children").
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        if let Err(error) = self.init_bots().await {
            tracing::error!(account = %self.account_id, %error, "bot initialization failed");
        }

        let metrics = tokio::spawn({
            let this = self.clone();
            let rx = shutdown.clone();
            async move { this.run_metrics_task(rx).await }
        });
        let events = tokio::spawn({
            let this = self.clone();
            let rx = shutdown.clone();
            async move { this.run_event_task(rx).await }
        });
        let token = tokio::spawn({
            let this = self.clone();
            let rx = shutdown.clone();
            async move { this.run_token_task(rx).await }
        });
        let symbols = tokio::spawn({
            let this = self.clone();
            let rx = shutdown.clone();
            async move { this.run_symbols_task(rx).await }
        });

        let _ = tokio::join!(metrics, events, token, symbols);

        let bot_ids: Vec<String> = self.loops.read().keys().cloned().collect();
        for bot_id in bot_ids {
            self.stop_bot_loop(&bot_id);
        }
    }

    // ---- §4.8 item 1: account metrics publisher ----

    async fn run_metrics_task(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    if let Err(error) = self.metrics_tick().await {
                        tracing::error!(account = %self.account_id, %error, "account metrics tick failed");
                    }
                }
            }
        }
    }

    async fn metrics_tick(&self) -> Result<(), SupervisorError> {
        let Some(info) = self.gateway.account_info().await? else {
            return Ok(());
        };
        let rounded = AccountSnapshot {
            balance: info.balance,
            equity: info.equity,
            margin: info.margin,
            free_margin: info.free_margin,
            profit: info.profit,
        }
        .rounded();

        let (changed, current) = {
            let account = self.account.lock();
            (account.snapshot_changed(&rounded), account.clone())
        };
        if !changed {
            return Ok(());
        }

        let remote_id = self.metrics.publish_snapshot(&current, rounded).await?;
        let mut account = self.account.lock();
        account.snapshot = rounded;
        if remote_id.is_some() {
            account.remote_id = remote_id;
        }
        Ok(())
    }

    // ---- §4.8 item 2: event subscriber ----

    async fn run_event_task(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    if let Err(error) = self.event_tick().await {
                        tracing::error!(account = %self.account_id, %error, "event subscriber tick failed");
                    }
                    self.processed.lock().tick();
                }
            }
        }
    }

    /// One pass of §4.8 item 2: fetch pending events for this account,
    /// and for each not-yet-processed id, delete it from the remote
    /// store *before* dispatching (at-most-once across restarts, §8
    /// invariant 5), then mark it processed.
    async fn event_tick(&self) -> Result<(), SupervisorError> {
        let events = self.event_feed.list_events(&self.account_id).await?;
        for event in events {
            let is_new = self.processed.lock().is_new(&event.id);
            if !is_new {
                continue;
            }
            // §9 Open Question 5: the source returns early if the delete
            // fails, to avoid ever double-dispatching; preserved here.
            if let Err(error) = self.event_feed.delete_event(&event.id).await {
                tracing::warn!(account = %self.account_id, event = %event.id, %error, "event delete failed, deferring dispatch");
                continue;
            }
            self.processed.lock().mark_processed(event.id.clone());
            self.dispatch_event(event).await;
        }
        Ok(())
    }

    async fn dispatch_event(&self, event: RemoteEvent) {
        let message = event.content.get("message").and_then(|v| v.as_str()).unwrap_or_default();

        if is_bot_lifecycle_message(message) {
            match serde_json::from_value::<BotLifecycleContent>(event.content) {
                Ok(content) => self.handle_bot_lifecycle(content).await,
                Err(error) => tracing::warn!(%error, "malformed bot-lifecycle event content, discarding"),
            }
            return;
        }

        let Some(bot_id) = event.bot else {
            tracing::warn!(message, "bot-targeted event missing bot id, discarding");
            return;
        };
        match serde_json::from_value::<EventContent>(event.content) {
            Ok(content) => {
                let Some(strategy_event) = StrategyEvent::parse(&content) else {
                    return;
                };
                let Some(strategy_loop) = self.loops.read().get(&bot_id).map(|h| h.strategy_loop.clone()) else {
                    tracing::warn!(bot = %bot_id, "event targets a bot with no running loop, discarding");
                    return;
                };
                if let Err(error) = strategy_loop.handle_event(strategy_event).await {
                    tracing::error!(bot = %bot_id, %error, "strategy event dispatch failed");
                }
            }
            Err(error) => tracing::warn!(%error, bot = %bot_id, "malformed strategy event content, discarding"),
        }
    }

    /// §3 "Bot": "Mutated by user events (`create_bot`/`update_bot`/
    /// `delete_bot`)". These target the account, not an existing bot
    /// loop, so the Account Supervisor (not a [`StrategyLoop`]) handles
    /// them directly.
    async fn handle_bot_lifecycle(&self, content: BotLifecycleContent) {
        match content.message.as_str() {
            "create_bot" => self.handle_create_bot(content).await,
            "update_bot" => self.handle_update_bot(content).await,
            "delete_bot" => self.handle_delete_bot(content).await,
            other => tracing::warn!(kind = other, "unrecognized bot-lifecycle event kind, discarding"),
        }
    }

    async fn handle_create_bot(&self, content: BotLifecycleContent) {
        let (Some(bot_id), Some(strategy), Some(magic), Some(symbol)) =
            (content.bot_id, content.strategy, content.magic, content.symbol)
        else {
            tracing::warn!("create_bot event missing required fields, discarding");
            return;
        };
        let mut bot = Bot::new(bot_id, self.account_id.clone(), strategy, magic, symbol);
        if let Some(overrides) = content.config {
            bot.config = merge_config_overrides(&bot.config, overrides);
        }
        if let Err(error) = self.directory.create_bot(&bot).await {
            tracing::error!(%error, bot = %bot.id, "create_bot remote persist failed");
        }
        self.spawn_bot_loop(bot).await;
    }

    async fn handle_update_bot(&self, content: BotLifecycleContent) {
        let Some(bot_id) = content.bot_id else {
            tracing::warn!("update_bot event missing bot id, discarding");
            return;
        };
        let Ok(Some(mut bot)) = self.bots_store.by_id(&bot_id).await else {
            tracing::warn!(bot = %bot_id, "update_bot targets unknown bot, discarding");
            return;
        };
        let resize_needed = content
            .symbol
            .as_ref()
            .is_some_and(|s| *s != bot.symbol)
            || content.magic.is_some_and(|m| m != bot.magic);

        if let Some(strategy) = content.strategy {
            bot.strategy = strategy;
        }
        if let Some(magic) = content.magic {
            bot.magic = magic;
        }
        if let Some(symbol) = content.symbol {
            bot.symbol = symbol;
        }
        if let Some(overrides) = content.config {
            bot.config = merge_config_overrides(&bot.config, overrides);
        }

        if let Err(error) = self.directory.update_bot(&bot).await {
            tracing::error!(%error, bot = %bot.id, "update_bot remote persist failed");
        }
        if let Err(error) = self.bots_store.save(&bot).await {
            tracing::error!(%error, bot = %bot.id, "update_bot local persist failed");
        }

        // The running loop captured `symbol`/`magic` at construction
        // (gateway calls need them up front); everything else it reads
        // fresh from the store each tick, so only a symbol/magic change
        // needs a respawn.
        if resize_needed {
            self.stop_bot_loop(&bot.id);
            self.spawn_bot_loop(bot).await;
        }
    }

    async fn handle_delete_bot(&self, content: BotLifecycleContent) {
        let Some(bot_id) = content.bot_id else {
            tracing::warn!("delete_bot event missing bot id, discarding");
            return;
        };
        if let Err(error) = self.directory.delete_bot(&bot_id).await {
            tracing::error!(%error, bot = %bot_id, "delete_bot remote persist failed");
        }
        if let Ok(Some(mut bot)) = self.bots_store.by_id(&bot_id).await {
            bot.runtime.stopped = true;
            if let Err(error) = self.bots_store.save(&bot).await {
                tracing::error!(%error, bot = %bot_id, "delete_bot local soft-delete failed");
            }
        }
        self.stop_bot_loop(&bot_id);
    }

    // ---- §4.8 item 3: token refresher ----

    async fn run_token_task(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(self.token_refresh_interval) => {
                    if let Err(error) = self.token.refresh().await {
                        tracing::error!(account = %self.account_id, %error, "token refresh failed");
                    }
                }
            }
        }
    }

    // ---- §4.8 item 4: symbol price publisher ----

    async fn run_symbols_task(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    self.symbols_tick().await;
                }
            }
        }
    }

    async fn symbols_tick(&self) {
        let symbol_names: HashSet<String> = self.loops.read().values().map(|h| h.symbol.clone()).collect();
        for name in symbol_names {
            match self.gateway.bid(&name).await {
                Ok(Some(bid)) => {
                    let id = self.symbol_ids.lock().get(&name).cloned();
                    let symbol = Symbol {
                        id,
                        account_id: self.account_id.clone(),
                        name: name.clone(),
                        price: bid,
                    };
                    match self.symbols.publish_symbol(&symbol).await {
                        Ok(Some(new_id)) => {
                            self.symbol_ids.lock().insert(name, new_id);
                        }
                        Ok(None) => {}
                        Err(error) => tracing::warn!(symbol = %name, %error, "symbol price publish failed"),
                    }
                }
                // Missing bid: skip this symbol without error (§8 boundary behavior).
                Ok(None) => {}
                Err(error) => tracing::warn!(symbol = %name, %error, "bid lookup failed"),
            }
        }
    }

    // ---- bot loop lifecycle ----

    async fn spawn_bot_loop(&self, bot: Bot) {
        let bot_id = bot.id.clone();
        let symbol = bot.symbol.clone();
        if let Err(error) = self.bots_store.save(&bot).await {
            tracing::error!(%error, bot = %bot_id, "failed to persist bot to local store");
        }

        let strategy_loop = Arc::new(StrategyLoop::new(
            bot.id.clone(),
            self.account_id.clone(),
            bot.symbol.clone(),
            bot.magic,
            self.gateway.clone(),
            self.cycles.clone(),
            self.orders.clone(),
            self.bots_store.clone(),
            self.remote_publisher.clone(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn({
            let loop_ref = strategy_loop.clone();
            async move { loop_ref.run(shutdown_rx).await }
        });

        self.loops.write().insert(
            bot_id,
            BotHandle {
                strategy_loop,
                symbol,
                shutdown: shutdown_tx,
                task,
            },
        );
    }

    fn stop_bot_loop(&self, bot_id: &str) {
        if let Some(handle) = self.loops.write().remove(bot_id) {
            let _ = handle.shutdown.send(true);
            handle.task.abort();
        }
    }
}

/// Shallow-merges `overrides` onto `base`'s JSON representation and
/// re-parses it into a [`StrategyConfig`]; on any coercion failure the
/// previous config is kept and a warning logged (§7 "Configuration": "the
/// strategy uses the documented default").
fn merge_config_overrides(base: &StrategyConfig, overrides: serde_json::Value) -> StrategyConfig {
    let mut merged = serde_json::to_value(base).expect("StrategyConfig always serializes");
    if let (serde_json::Value::Object(base_map), serde_json::Value::Object(override_map)) = (&mut merged, overrides) {
        for (key, value) in override_map {
            base_map.insert(key, value);
        }
    }
    serde_json::from_value(merged).unwrap_or_else(|error| {
        tracing::warn!(%error, "bot config override failed to coerce, keeping previous config");
        base.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gridloop_engine::{Cycle, EngineError};
    use gridloop_execution::{ExecutionError, Order};
    use gridloop_gateway::MockGateway;
    use gridloop_markets::StrategyKind;
    use gridloop_strategy::StrategyError;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct NoopCycles;
    #[async_trait]
    impl CycleRepository for NoopCycles {
        async fn save(&self, _cycle: &Cycle) -> Result<(), EngineError> {
            Ok(())
        }
        async fn by_id(&self, _id: &str) -> Result<Option<Cycle>, EngineError> {
            Ok(None)
        }
        async fn active_cycles(&self, _bot_id: &str) -> Result<Vec<Cycle>, EngineError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct NoopOrders;
    #[async_trait]
    impl OrderRepository for NoopOrders {
        async fn save(&self, _order: &Order) -> Result<(), ExecutionError> {
            Ok(())
        }
        async fn by_ticket(&self, _ticket: i64) -> Result<Option<Order>, ExecutionError> {
            Ok(None)
        }
        async fn by_cycle(&self, _cycle_id: &str) -> Result<Vec<Order>, ExecutionError> {
            Ok(Vec::new())
        }
        async fn open_orders_only(&self, _bot_id: &str) -> Result<Vec<Order>, ExecutionError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct InMemoryBots(parking_lot::Mutex<HashMap<String, Bot>>);
    #[async_trait]
    impl BotRepository for InMemoryBots {
        async fn by_id(&self, bot_id: &str) -> Result<Option<Bot>, StrategyError> {
            Ok(self.0.lock().get(bot_id).cloned())
        }
        async fn save(&self, bot: &Bot) -> Result<(), StrategyError> {
            self.0.lock().insert(bot.id.clone(), bot.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct EmptyDirectory {
        created: AtomicUsize,
    }
    #[async_trait]
    impl BotDirectory for EmptyDirectory {
        async fn list_bots(&self, _account_id: &str) -> Result<Vec<Bot>, SupervisorError> {
            Ok(Vec::new())
        }
        async fn create_bot(&self, _bot: &Bot) -> Result<(), SupervisorError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn update_bot(&self, _bot: &Bot) -> Result<(), SupervisorError> {
            Ok(())
        }
        async fn delete_bot(&self, _bot_id: &str) -> Result<(), SupervisorError> {
            Ok(())
        }
    }

    struct NoEvents;
    #[async_trait]
    impl EventFeed for NoEvents {
        async fn list_events(&self, _account_id: &str) -> Result<Vec<RemoteEvent>, SupervisorError> {
            Ok(Vec::new())
        }
        async fn delete_event(&self, _event_id: &str) -> Result<(), SupervisorError> {
            Ok(())
        }
    }

    struct RecordingMetrics(AtomicUsize);
    #[async_trait]
    impl AccountMetricsPublisher for RecordingMetrics {
        async fn publish_snapshot(&self, _account: &Account, _snapshot: AccountSnapshot) -> Result<Option<String>, SupervisorError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some("remote-1".to_string()))
        }
    }

    struct NoopSymbols;
    #[async_trait]
    impl SymbolPricePublisher for NoopSymbols {
        async fn publish_symbol(&self, _symbol: &Symbol) -> Result<Option<String>, SupervisorError> {
            Ok(None)
        }
    }

    struct NoopToken;
    #[async_trait]
    impl TokenRefresher for NoopToken {
        async fn refresh(&self) -> Result<(), SupervisorError> {
            Ok(())
        }
    }

    fn supervisor(metrics: Arc<dyn AccountMetricsPublisher>) -> AccountSupervisor {
        AccountSupervisor::new(
            Account::new("acct-1", "1001", "Demo"),
            Arc::new(MockGateway::new()),
            Arc::new(NoopCycles),
            Arc::new(NoopOrders),
            Arc::new(InMemoryBots::default()),
            None,
            Arc::new(EmptyDirectory::default()),
            Arc::new(NoEvents),
            metrics,
            Arc::new(NoopSymbols),
            Arc::new(NoopToken),
            Duration::from_secs(7 * 24 * 60 * 60),
        )
    }

    #[tokio::test]
    async fn metrics_tick_publishes_only_on_first_change() {
        let metrics = Arc::new(RecordingMetrics(AtomicUsize::new(0)));
        let sup = supervisor(metrics.clone());
        sup.gateway.initialize(None).await.unwrap();
        sup.gateway.login("demo", None, None).await.unwrap();

        sup.metrics_tick().await.unwrap();
        assert_eq!(metrics.0.load(Ordering::SeqCst), 1);

        // Same snapshot again: no publish.
        sup.metrics_tick().await.unwrap();
        assert_eq!(metrics.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_bot_spawns_a_loop_and_persists_remotely() {
        let metrics = Arc::new(RecordingMetrics(AtomicUsize::new(0)));
        let sup = supervisor(metrics);
        sup.handle_create_bot(BotLifecycleContent {
            message: "create_bot".to_string(),
            bot_id: Some("bot-1".to_string()),
            strategy: Some(StrategyKind::CycleTrader),
            magic: Some(42),
            symbol: Some("EURUSD".to_string()),
            config: None,
        })
        .await;
        assert!(sup.loops.read().contains_key("bot-1"));
    }

    #[tokio::test]
    async fn delete_bot_stops_its_loop() {
        let metrics = Arc::new(RecordingMetrics(AtomicUsize::new(0)));
        let sup = supervisor(metrics);
        sup.spawn_bot_loop(Bot::new("bot-1", "acct-1", StrategyKind::CycleTrader, 1, "EURUSD")).await;
        assert!(sup.loops.read().contains_key("bot-1"));

        sup.handle_delete_bot(BotLifecycleContent {
            message: "delete_bot".to_string(),
            bot_id: Some("bot-1".to_string()),
            strategy: None,
            magic: None,
            symbol: None,
            config: None,
        })
        .await;
        assert!(!sup.loops.read().contains_key("bot-1"));
    }

    #[test]
    fn merge_config_overrides_keeps_previous_on_bad_type() {
        let base = StrategyConfig::default();
        let merged = merge_config_overrides(&base, serde_json::json!({"lot_size": "not-a-number"}));
        assert_eq!(merged, base);
    }

    #[test]
    fn merge_config_overrides_applies_valid_fields() {
        let base = StrategyConfig::default();
        let merged = merge_config_overrides(&base, serde_json::json!({"pips_step": "12.5"}));
        assert_eq!(merged.pips_step, dec!(12.5));
    }
}
