//! Process-wide startup configuration, loaded once from the environment
//! (§6 Environment). Every field has the documented default so a bare
//! `gridloop-supervisor` invocation works against a local PocketBase-style
//! instance without any environment set up.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:8090";
const DEFAULT_AUTH_COLLECTION: &str = "users";
const DEFAULT_LOCAL_DB_PATH: &str = "./gridloop.db";
const DEFAULT_ACCOUNT_ID: &str = "default";

/// Typed view over the process environment, following the teacher's
/// `system/config.rs` convention of one struct assembled once at startup
/// rather than scattered `env::var` calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `GRIDLOOP_POCKETBASE_URL` — remote document-store base URL (§6).
    pub remote_url: String,
    /// `GRIDLOOP_AUTH_COLLECTION` — the remote store's auth collection
    /// name (§6), defaulted to `users`.
    pub auth_collection: String,
    /// `GRIDLOOP_LOCAL_DB_PATH` — path to the local relational store file
    /// (§6 "Local store"), schema created at startup.
    pub local_db_path: String,
    /// `GRIDLOOP_SYNC_DELAY_MS` — the reconciliation service's
    /// intra-loop delay between broker read, local read, and writeback
    /// (§4.7), and the false-closed-cycle double-verification delay
    /// (§4.4). Defaults to 500ms.
    pub sync_delay: Duration,
    /// `GRIDLOOP_TOKEN_REFRESH_DAYS` — how often the remote session
    /// token is refreshed (§4.3, §4.8 item 3). Defaults to 7 days.
    pub token_refresh_days: u64,
    /// `GRIDLOOP_ACCOUNT_ID` — the local id of the one account this
    /// process supervises. Login flows and multi-account provisioning
    /// are out of scope (§1); the facade binary wires exactly one
    /// [`gridloop_supervisor::AccountSupervisor`] from this value.
    pub account_id: String,
    /// `GRIDLOOP_BROKER_LOGIN` — the broker terminal login passed to
    /// [`gridloop_gateway::BrokerGateway::login`].
    pub broker_login: String,
    /// `GRIDLOOP_IDENTITY` / `GRIDLOOP_PASSWORD` — remote store
    /// credentials used for the initial authentication and subsequent
    /// token refreshes (§4.3, §4.8 item 3). Not set by default; a
    /// missing value fails fast at startup rather than running
    /// unauthenticated.
    pub remote_identity: String,
    pub remote_password: String,
}

impl Config {
    /// Assembles a [`Config`] from the process environment, falling back
    /// to the documented defaults for anything unset (§6).
    pub fn from_env() -> Self {
        Self {
            remote_url: std::env::var("GRIDLOOP_POCKETBASE_URL")
                .unwrap_or_else(|_| DEFAULT_REMOTE_URL.to_string()),
            auth_collection: std::env::var("GRIDLOOP_AUTH_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_AUTH_COLLECTION.to_string()),
            local_db_path: std::env::var("GRIDLOOP_LOCAL_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_LOCAL_DB_PATH.to_string()),
            sync_delay: std::env::var("GRIDLOOP_SYNC_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(500)),
            token_refresh_days: std::env::var("GRIDLOOP_TOKEN_REFRESH_DAYS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(7),
            account_id: std::env::var("GRIDLOOP_ACCOUNT_ID").unwrap_or_else(|_| DEFAULT_ACCOUNT_ID.to_string()),
            broker_login: std::env::var("GRIDLOOP_BROKER_LOGIN").unwrap_or_default(),
            remote_identity: std::env::var("GRIDLOOP_IDENTITY").unwrap_or_default(),
            remote_password: std::env::var("GRIDLOOP_PASSWORD").unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            auth_collection: DEFAULT_AUTH_COLLECTION.to_string(),
            local_db_path: DEFAULT_LOCAL_DB_PATH.to_string(),
            sync_delay: Duration::from_millis(500),
            token_refresh_days: 7,
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            broker_login: String::new(),
            remote_identity: String::new(),
            remote_password: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_environment() {
        let config = Config::default();
        assert_eq!(config.remote_url, DEFAULT_REMOTE_URL);
        assert_eq!(config.auth_collection, "users");
        assert_eq!(config.sync_delay, Duration::from_millis(500));
        assert_eq!(config.token_refresh_days, 7);
    }
}
