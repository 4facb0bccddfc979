//! Process entrypoint (§5 "Concurrency Model"): wires one broker
//! connection, one Local Store pool, one Remote Store client, one
//! [`AccountSupervisor`] and one [`ReconciliationService`] for the
//! account named by `GRIDLOOP_ACCOUNT_ID`, then runs them until SIGINT
//! cancels the shared shutdown channel (§5 "On process shutdown the
//! Supervisor cancels its children").
//!
//! Multi-account provisioning and broker login flows are out of scope
//! (§1) — this binary demonstrates the wiring for the one account its
//! environment names; [`AccountSupervisor`] itself is account-count
//! agnostic and a deployment that needs more accounts spawns one of
//! these per account.

use gridloop::GridloopError;
use gridloop_core::logging::init_logging;
use gridloop_core::system::Config;
use gridloop_engine::CycleRepository;
use gridloop_execution::OrderRepository;
use gridloop_gateway::{BrokerGateway, MockGateway};
use gridloop_markets::Account;
use gridloop_reconcile::ReconciliationService;
use gridloop_remote::RemoteClient;
use gridloop_store::LocalStore;
use gridloop_strategy::BotRepository;
use gridloop_supervisor::{AccountSupervisor, RemoteTokenRefresher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), GridloopError> {
    init_logging();
    let config = Config::from_env();
    tracing::info!(account = %config.account_id, "starting gridloop");

    let database_url = format!("sqlite://{}", config.local_db_path);
    let store = Arc::new(LocalStore::connect(&database_url).await?);

    let remote = Arc::new(RemoteClient::new(&config.remote_url, config.auth_collection.clone(), config.token_refresh_days)?);
    remote.authenticate(&config.remote_identity, &config.remote_password).await?;

    // The real broker terminal is an out-of-scope collaborator (§1); the
    // in-memory mock stands in until a `real_dll`-gated implementation
    // lands in `gridloop-gateway` (see its crate doc).
    let gateway: Arc<dyn BrokerGateway> = Arc::new(MockGateway::new());
    gateway.initialize(None).await?;
    gateway.login(&config.broker_login, None, None).await?;

    let account = Account::new(config.account_id.clone(), config.broker_login.clone(), config.account_id.clone());

    let cycles: Arc<dyn CycleRepository> = store.clone();
    let orders: Arc<dyn OrderRepository> = store.clone();
    let bots: Arc<dyn BotRepository> = store.clone();

    let token_refresher = Arc::new(RemoteTokenRefresher::new(
        remote.clone(),
        config.remote_identity.clone(),
        config.remote_password.clone(),
    ));

    let supervisor = Arc::new(AccountSupervisor::new(
        account,
        gateway.clone(),
        cycles.clone(),
        orders.clone(),
        bots,
        Some(remote.clone()),
        remote.clone(),
        remote.clone(),
        remote.clone(),
        remote.clone(),
        token_refresher,
        Duration::from_secs(config.token_refresh_days * 24 * 60 * 60),
    ));

    // Bot ids are only known once the Supervisor lists them from the
    // remote store; the reconciliation pass widens its own set lazily on
    // its next `tick` once bots exist, matching `gridloop-reconcile`'s
    // per-bot `open_orders_only` lookups (empty at startup is a no-op
    // pass, not an error).
    let reconcile = Arc::new(ReconciliationService::new(
        gateway.clone(),
        orders.clone(),
        cycles.clone(),
        Vec::new(),
        config.sync_delay,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let supervisor_task = tokio::spawn({
        let supervisor = supervisor.clone();
        let rx = shutdown_rx.clone();
        async move { supervisor.run(rx).await }
    });
    let reconcile_task = tokio::spawn({
        let reconcile = reconcile.clone();
        let rx = shutdown_rx.clone();
        async move { reconcile.run(rx).await }
    });

    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = tokio::join!(supervisor_task, reconcile_task);
    tracing::info!("gridloop stopped");
    Ok(())
}
