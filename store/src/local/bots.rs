//! [`BotRepository`] over the `bots` table.

use super::LocalStore;
use async_trait::async_trait;
use gridloop_markets::Bot;
use gridloop_strategy::{BotRepository, StrategyError};
use sqlx::Row;

fn map_err(err: crate::error::StoreError) -> StrategyError {
    StrategyError::BotRepository(err.to_string())
}

#[async_trait]
impl BotRepository for LocalStore {
    async fn by_id(&self, bot_id: &str) -> Result<Option<Bot>, StrategyError> {
        let row = sqlx::query("SELECT body FROM bots WHERE id = ?")
            .bind(bot_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::StoreError::from)
            .map_err(map_err)?;

        row.map(|row| {
            let body: String = row.get("body");
            serde_json::from_str(&body)
                .map_err(crate::error::StoreError::from)
                .map_err(map_err)
        })
        .transpose()
    }

    async fn save(&self, bot: &Bot) -> Result<(), StrategyError> {
        let body = serde_json::to_string(bot)
            .map_err(crate::error::StoreError::from)
            .map_err(map_err)?;
        sqlx::query(
            r#"
            INSERT INTO bots (id, account_id, body, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                account_id = excluded.account_id,
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&bot.id)
        .bind(&bot.account_id)
        .bind(&body)
        .execute(&self.pool)
        .await
        .map_err(crate::error::StoreError::from)
        .map_err(map_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_markets::StrategyKind;

    #[tokio::test]
    async fn save_and_fetch_round_trips() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        let bot = Bot::new("bot-1", "acct-1", StrategyKind::CycleTrader, 1001, "EURUSD");
        store.save(&bot).await.unwrap();

        let fetched = store.by_id("bot-1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "bot-1");
        assert_eq!(fetched.magic, 1001);
    }

    #[tokio::test]
    async fn missing_bot_returns_none() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        assert!(store.by_id("nope").await.unwrap().is_none());
    }
}
