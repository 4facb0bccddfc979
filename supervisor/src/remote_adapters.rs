//! Implements this crate's ports ([`crate::repository`]) against
//! `gridloop_remote::RemoteClient`, the same "port defined by the
//! consumer, implemented by the transport crate" split
//! `gridloop-remote` itself uses for `gridloop_strategy::RemoteCyclePublisher`.

use crate::error::SupervisorError;
use crate::repository::{AccountMetricsPublisher, BotDirectory, EventFeed, RemoteEvent, SymbolPricePublisher, TokenRefresher};
use async_trait::async_trait;
use gridloop_markets::{Account, AccountSnapshot, Bot, Symbol};
use gridloop_remote::{Clause, Filter, RemoteClient};

fn map(err: gridloop_remote::RemoteError) -> SupervisorError {
    SupervisorError::Remote(err)
}

#[async_trait]
impl AccountMetricsPublisher for RemoteClient {
    async fn publish_snapshot(&self, account: &Account, snapshot: AccountSnapshot) -> Result<Option<String>, SupervisorError> {
        let mut record = account.clone();
        record.snapshot = snapshot;
        match &account.remote_id {
            Some(id) => {
                self.update_record("accounts", id, &record).await.map_err(map)?;
                Ok(Some(id.clone()))
            }
            None => {
                #[derive(serde::Deserialize)]
                struct Created {
                    id: String,
                }
                let created: Created = self.create_record("accounts", &record, false).await.map_err(map)?;
                Ok(Some(created.id))
            }
        }
    }
}

#[async_trait]
impl SymbolPricePublisher for RemoteClient {
    async fn publish_symbol(&self, symbol: &Symbol) -> Result<Option<String>, SupervisorError> {
        match &symbol.id {
            Some(id) => {
                self.update_record("symbols", id, symbol).await.map_err(map)?;
                Ok(Some(id.clone()))
            }
            None => {
                #[derive(serde::Deserialize)]
                struct Created {
                    id: String,
                }
                let created: Created = self.create_record("symbols", symbol, false).await.map_err(map)?;
                Ok(Some(created.id))
            }
        }
    }
}

#[async_trait]
impl EventFeed for RemoteClient {
    async fn list_events(&self, account_id: &str) -> Result<Vec<RemoteEvent>, SupervisorError> {
        let filter = Filter::new().and(Clause::eq("account", account_id));
        RemoteClient::list_events::<RemoteEvent>(self, &filter).await.map_err(map)
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), SupervisorError> {
        self.delete_record("events", event_id).await.map_err(map)
    }
}

#[async_trait]
impl BotDirectory for RemoteClient {
    async fn list_bots(&self, account_id: &str) -> Result<Vec<Bot>, SupervisorError> {
        let filter = Filter::new().and(Clause::eq("account_id", account_id));
        self.list_records("bots", &filter).await.map_err(map)
    }

    async fn create_bot(&self, bot: &Bot) -> Result<(), SupervisorError> {
        let _: serde_json::Value = self.create_record("bots", bot, false).await.map_err(map)?;
        Ok(())
    }

    async fn update_bot(&self, bot: &Bot) -> Result<(), SupervisorError> {
        self.update_record("bots", &bot.id, bot).await.map_err(map)
    }

    async fn delete_bot(&self, bot_id: &str) -> Result<(), SupervisorError> {
        self.delete_record("bots", bot_id).await.map_err(map)
    }
}

/// Refreshes the remote session using credentials held for the lifetime
/// of the process (§4.8 item 3, §4.3 "refresh the session token... on
/// demand"). A thin adapter rather than a `RemoteClient` method because
/// credential storage is this crate's concern, not the transport's.
pub struct RemoteTokenRefresher {
    client: std::sync::Arc<RemoteClient>,
    identity: String,
    password: String,
}

impl RemoteTokenRefresher {
    pub fn new(client: std::sync::Arc<RemoteClient>, identity: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client,
            identity: identity.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl TokenRefresher for RemoteTokenRefresher {
    async fn refresh(&self) -> Result<(), SupervisorError> {
        self.client.authenticate(&self.identity, &self.password).await.map_err(map)
    }
}
