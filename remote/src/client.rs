//! The REST half of the remote document-store client (§4.3): bearer-token
//! auth in place of the teacher's HMAC query-signing, the same
//! "one signer, every request goes through it" shape as
//! `BinanceRequestSigner`/`RequestSigner`.

use crate::auth::Session;
use crate::error::RemoteError;
use crate::filter::Filter;
use crate::serialize::{to_remote_cycle_creation_json, to_remote_json};
use async_trait::async_trait;
use chrono::Utc;
use gridloop_engine::Cycle;
use gridloop_strategy::{RemoteCyclePublisher, StrategyError};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;
use url::Url;

/// Thin REST wrapper over a PocketBase-style remote document store. One
/// client per process; cheap to clone (`reqwest::Client` is
/// `Arc`-backed internally).
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: Url,
    auth_collection: String,
    token_refresh_days: u64,
    session: std::sync::Arc<Mutex<Session>>,
}

impl RemoteClient {
    pub fn new(base_url: &str, auth_collection: impl Into<String>, token_refresh_days: u64) -> Result<Self, RemoteError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            auth_collection: auth_collection.into(),
            token_refresh_days,
            session: std::sync::Arc::new(Mutex::new(Session::default())),
        })
    }

    /// Authenticates against the configured auth collection, storing the
    /// returned token for subsequent requests (§4.3 "authenticate with
    /// credentials").
    pub async fn authenticate(&self, identity: &str, password: &str) -> Result<(), RemoteError> {
        #[derive(Serialize)]
        struct AuthRequest<'a> {
            identity: &'a str,
            password: &'a str,
        }
        #[derive(serde::Deserialize)]
        struct AuthResponse {
            token: String,
        }

        let url = self
            .base_url
            .join(&format!("api/collections/{}/auth-with-password", self.auth_collection))?;
        let response: AuthResponse = self
            .http
            .post(url)
            .json(&AuthRequest { identity, password })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| RemoteError::Auth(e.to_string()))?
            .json()
            .await?;

        self.session.lock().expect("poisoned").set(response.token, Utc::now());
        Ok(())
    }

    /// Refreshes the session token if it is absent or older than the
    /// configured interval (§4.3, §4.8 item 3).
    pub async fn refresh_token_if_stale(&self, identity: &str, password: &str) -> Result<(), RemoteError> {
        let stale = self
            .session
            .lock()
            .expect("poisoned")
            .needs_refresh(self.token_refresh_days, Utc::now());
        if stale {
            self.authenticate(identity, password).await?;
        }
        Ok(())
    }

    fn authorized(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder, RemoteError> {
        let token = self
            .session
            .lock()
            .expect("poisoned")
            .token()
            .map(str::to_string)
            .ok_or(RemoteError::NotAuthenticated)?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    fn collection_url(&self, collection: &str) -> Result<Url, RemoteError> {
        Ok(self.base_url.join(&format!("api/collections/{collection}/records"))?)
    }

    fn record_url(&self, collection: &str, id: &str) -> Result<Url, RemoteError> {
        Ok(self.base_url.join(&format!("api/collections/{collection}/records/{id}"))?)
    }

    /// CRUD: create a record in `collection`, applying the cycle-creation
    /// numeric coercion when `collection` is a cycle family table.
    pub async fn create_record<T: Serialize, R: DeserializeOwned>(
        &self,
        collection: &str,
        record: &T,
        is_cycle_creation: bool,
    ) -> Result<R, RemoteError> {
        let body = if is_cycle_creation {
            to_remote_cycle_creation_json(record)?
        } else {
            to_remote_json(record)?
        };
        let response = self
            .authorized(Method::POST, self.collection_url(collection)?)?
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn update_record<T: Serialize>(&self, collection: &str, id: &str, record: &T) -> Result<(), RemoteError> {
        let body = to_remote_json(record)?;
        self.authorized(Method::PATCH, self.record_url(collection, id)?)?
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn get_record<R: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<R, RemoteError> {
        let response = self
            .authorized(Method::GET, self.record_url(collection, id)?)?
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Deletes a record by id. Used by the Account Supervisor's event
    /// subscriber to remove a dispatched event *before* handing it to a
    /// strategy loop (§4.8 item 2, §9 Open Question 5).
    pub async fn delete_record(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.authorized(Method::DELETE, self.record_url(collection, id)?)?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Lists any collection's records, optionally narrowed by a
    /// predicate [`Filter`] (§4.3 "Filtering"). [`Self::list_events`] is
    /// the `events`-collection specialisation of this.
    pub async fn list_records<R: DeserializeOwned>(&self, collection: &str, filter: &Filter) -> Result<Vec<R>, RemoteError> {
        let mut url = self.collection_url(collection)?;
        if !filter.is_empty() {
            url.query_pairs_mut().append_pair("filter", &filter.to_string());
        }
        #[derive(serde::Deserialize)]
        struct Page<R> {
            items: Vec<R>,
        }
        let response: Page<R> = self
            .authorized(Method::GET, url)?
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.items)
    }

    /// Lists events, optionally narrowed by a predicate [`Filter`] (§4.3
    /// "Filtering").
    pub async fn list_events<R: DeserializeOwned>(&self, filter: &Filter) -> Result<Vec<R>, RemoteError> {
        self.list_records("events", filter).await
    }

    /// Sends one log line to the remote store (§4.3 "send log... updates").
    pub async fn send_log(&self, bot_id: &str, message: &str) -> Result<(), RemoteError> {
        #[derive(Serialize)]
        struct LogRecord<'a> {
            bot_id: &'a str,
            message: &'a str,
        }
        let _: serde_json::Value = self
            .create_record("logs", &LogRecord { bot_id, message }, false)
            .await?;
        Ok(())
    }

    /// Pushes one symbol tick to the remote store, creating the record
    /// on its first publish (`id` is only assigned by the remote store).
    pub async fn update_symbol(&self, symbol: &gridloop_markets::Symbol) -> Result<(), RemoteError> {
        match &symbol.id {
            Some(id) => self.update_record("symbols", id, symbol).await,
            None => self
                .create_record::<_, serde_json::Value>("symbols", symbol, false)
                .await
                .map(|_| ()),
        }
    }

    /// Updates a bot's `stopped` runtime flag and magic number remotely
    /// (§4.3 "update bot status and magic number").
    pub async fn update_bot_status(&self, bot: &gridloop_markets::Bot) -> Result<(), RemoteError> {
        self.update_record("bots", &bot.id, bot).await
    }
}

#[async_trait]
impl RemoteCyclePublisher for RemoteClient {
    async fn publish_cycle(&self, cycle: &Cycle) -> Result<(), StrategyError> {
        let result = match &cycle.remote_id {
            Some(remote_id) => self.update_record("cycles", remote_id, cycle).await,
            None => self
                .create_record::<_, serde_json::Value>("cycles", cycle, true)
                .await
                .map(|_| ()),
        };
        result.map_err(|err| StrategyError::RemotePublish(err.to_string()))
    }
}
