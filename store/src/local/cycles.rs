//! [`CycleRepository`] over the `cycles` table.

use super::LocalStore;
use async_trait::async_trait;
use gridloop_engine::{Cycle, CycleRepository, EngineError};
use sqlx::Row;

fn map_err(err: impl Into<crate::error::StoreError>) -> EngineError {
    EngineError::Repository(err.into().to_string())
}

#[async_trait]
impl CycleRepository for LocalStore {
    async fn save(&self, cycle: &Cycle) -> Result<(), EngineError> {
        let body = serde_json::to_string(cycle).map_err(map_err)?;
        sqlx::query(
            r#"
            INSERT INTO cycles (id, bot_id, account_id, is_closed, body, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                bot_id = excluded.bot_id,
                account_id = excluded.account_id,
                is_closed = excluded.is_closed,
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&cycle.id)
        .bind(&cycle.bot_id)
        .bind(&cycle.account_id)
        .bind(cycle.is_closed)
        .bind(&body)
        .execute(&self.pool)
        .await
        .map_err(|e| map_err(crate::error::StoreError::from(e)))?;

        Ok(())
    }

    async fn by_id(&self, id: &str) -> Result<Option<Cycle>, EngineError> {
        let row = sqlx::query("SELECT body FROM cycles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;

        row.map(|row| {
            let body: String = row.get("body");
            serde_json::from_str(&body).map_err(map_err)
        })
        .transpose()
    }

    async fn active_cycles(&self, bot_id: &str) -> Result<Vec<Cycle>, EngineError> {
        let rows = sqlx::query(
            "SELECT body FROM cycles WHERE bot_id = ? AND is_closed = 0 ORDER BY created_at ASC",
        )
        .bind(bot_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err(crate::error::StoreError::from(e)))?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.get("body");
                serde_json::from_str(&body).map_err(map_err)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_markets::{CycleKind, OpenedBy, Side};
    use rust_decimal_macros::dec;

    fn sample_cycle(id: &str, bot_id: &str) -> Cycle {
        Cycle::open(
            id,
            bot_id,
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
    async fn save_and_fetch_round_trips() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        let cycle = sample_cycle("c-1", "bot-1");
        store.save(&cycle).await.unwrap();

        let fetched = store.by_id("c-1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "c-1");
        assert_eq!(fetched.open_price, dec!(1.10000));
    }

    #[tokio::test]
    async fn active_cycles_excludes_closed() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        let open = sample_cycle("c-open", "bot-1");
        let mut closed = sample_cycle("c-closed", "bot-1");
        closed.mark_closed("manual", "test", chrono::Utc::now());

        store.save(&open).await.unwrap();
        store.save(&closed).await.unwrap();

        let active = store.active_cycles("bot-1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "c-open");
    }

    #[tokio::test]
    async fn save_is_idempotent_upsert() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        let mut cycle = sample_cycle("c-1", "bot-1");
        store.save(&cycle).await.unwrap();

        cycle.total_profit = dec!(42);
        store.save(&cycle).await.unwrap();

        let fetched = store.by_id("c-1").await.unwrap().unwrap();
        assert_eq!(fetched.total_profit, dec!(42));
    }
}
