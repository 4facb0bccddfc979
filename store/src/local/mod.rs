//! `LocalStore` — the relational Local Store (§4.2, component C2).
//!
//! The source keeps one table pair (`ct_cycles`/`ct_cycles_orders`,
//! `ah_cycles`/`ah_cycles_orders`, ...) per strategy family because each
//! family's original schema grew independently. Here every family shares
//! one [`gridloop_engine::Cycle`] type, so one `cycles` table (plus
//! `orders`, `bots`) suffices; the family distinction lives in
//! `Bot::strategy`, not the schema. Each row keeps a JSON `body` column
//! holding the full serialized record next to the handful of columns
//! every query actually filters on, the same split `poruru210-sankey-copier`'s
//! `db` module uses for `master_settings`/`slave_settings`.
//!
//! Schema migrations that only *add* a field to `Cycle` need no `ALTER
//! TABLE` here: `#[serde(default)]` on the new field lets a legacy JSON
//! body missing it deserialize with that default (§4.2's "missing
//! columns on legacy rows take those defaults", translated to the JSON
//! body this store actually persists).

mod bots;
mod cycles;
mod orders;

use crate::error::StoreError;
use sqlx::sqlite::SqlitePool;

/// Owns the connection pool and creates the schema on first connect.
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Connects to `database_url` (e.g. `sqlite://gridloop.db` or
    /// `sqlite::memory:` in tests) and ensures the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(database_url).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Wraps an already-open pool (used by tests and by callers that
    /// manage the pool's lifetime themselves).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cycles (
                id TEXT PRIMARY KEY,
                bot_id TEXT NOT NULL,
                account_id TEXT NOT NULL,
                is_closed INTEGER NOT NULL DEFAULT 0,
                body TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cycles_bot ON cycles(bot_id)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cycles_bot_active ON cycles(bot_id, is_closed)")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                ticket INTEGER PRIMARY KEY,
                cycle_id TEXT NOT NULL,
                account_id TEXT NOT NULL,
                is_closed INTEGER NOT NULL DEFAULT 0,
                body TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_cycle ON orders(cycle_id)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_closed ON orders(is_closed)")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bots (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bots_account ON bots(account_id)")
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        LocalStore::migrate(store.pool()).await.unwrap();
    }
}
