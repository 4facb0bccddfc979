//! [`OrderRepository`] over the `orders` table.
//!
//! `Order` carries no `bot_id` of its own (§4.4) — only `cycle_id`/
//! `account_id` — so `open_orders_only` joins through `cycles` to reach
//! the owning bot, rather than duplicating `bot_id` onto every order row.

use super::LocalStore;
use async_trait::async_trait;
use gridloop_execution::{ExecutionError, Order, OrderRepository};
use sqlx::Row;

fn map_err(err: impl Into<crate::error::StoreError>) -> ExecutionError {
    ExecutionError::Repository(err.into().to_string())
}

#[async_trait]
impl OrderRepository for LocalStore {
    async fn save(&self, order: &Order) -> Result<(), ExecutionError> {
        let body = serde_json::to_string(order).map_err(map_err)?;
        sqlx::query(
            r#"
            INSERT INTO orders (ticket, cycle_id, account_id, is_closed, body, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(ticket) DO UPDATE SET
                cycle_id = excluded.cycle_id,
                account_id = excluded.account_id,
                is_closed = excluded.is_closed,
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(order.ticket)
        .bind(&order.cycle_id)
        .bind(&order.account_id)
        .bind(order.is_closed)
        .bind(&body)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(())
    }

    async fn by_ticket(&self, ticket: i64) -> Result<Option<Order>, ExecutionError> {
        let row = sqlx::query("SELECT body FROM orders WHERE ticket = ?")
            .bind(ticket)
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::StoreError::from)
            .map_err(map_err)?;

        row.map(|row| {
            let body: String = row.get("body");
            serde_json::from_str(&body)
                .map_err(map_err)
        })
        .transpose()
    }

    async fn by_cycle(&self, cycle_id: &str) -> Result<Vec<Order>, ExecutionError> {
        let rows = sqlx::query("SELECT body FROM orders WHERE cycle_id = ? ORDER BY created_at ASC")
            .bind(cycle_id)
            .fetch_all(&self.pool)
            .await
            .map_err(crate::error::StoreError::from)
            .map_err(map_err)?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.get("body");
                serde_json::from_str(&body)
                    .map_err(crate::error::StoreError::from)
                    .map_err(map_err)
            })
            .collect()
    }

    async fn open_orders_only(&self, bot_id: &str) -> Result<Vec<Order>, ExecutionError> {
        let rows = sqlx::query(
            r#"
            SELECT orders.body AS body
            FROM orders
            JOIN cycles ON cycles.id = orders.cycle_id
            WHERE cycles.bot_id = ? AND orders.is_closed = 0
            ORDER BY orders.created_at ASC
            "#,
        )
        .bind(bot_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.get("body");
                serde_json::from_str(&body)
                    .map_err(crate::error::StoreError::from)
                    .map_err(map_err)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_engine::{Cycle, CycleRepository};
    use gridloop_markets::{CycleKind, OpenedBy, OrderKind, Side};
    use rust_decimal_macros::dec;

    async fn seed_cycle(store: &LocalStore, id: &str, bot_id: &str) {
        let cycle = Cycle::open(
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
        );
        store.save(&cycle).await.unwrap();
    }

    #[tokio::test]
    async fn save_and_fetch_round_trips() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        seed_cycle(&store, "c-1", "bot-1").await;

        let order = Order::new(
            1,
            OrderKind::Market,
            Side::Buy,
            "EURUSD",
            1,
            dec!(1.10000),
            dec!(0.01),
            "c-1",
            "acct-1",
        );
        store.save(&order).await.unwrap();

        let fetched = store.by_ticket(1).await.unwrap().unwrap();
        assert_eq!(fetched.ticket, 1);
        assert_eq!(fetched.cycle_id, "c-1");
    }

    #[tokio::test]
    async fn open_orders_only_joins_through_cycle_bot_id() {
        let store = LocalStore::connect("sqlite::memory:").await.unwrap();
        seed_cycle(&store, "c-1", "bot-1").await;
        seed_cycle(&store, "c-2", "bot-2").await;

        let order_a = Order::new(1, OrderKind::Market, Side::Buy, "EURUSD", 1, dec!(1.1), dec!(0.01), "c-1", "acct-1");
        let mut order_b = Order::new(2, OrderKind::Market, Side::Buy, "EURUSD", 1, dec!(1.1), dec!(0.01), "c-1", "acct-1");
        order_b.is_closed = true;
        let order_c = Order::new(3, OrderKind::Market, Side::Buy, "EURUSD", 1, dec!(1.1), dec!(0.01), "c-2", "acct-1");

        store.save(&order_a).await.unwrap();
        store.save(&order_b).await.unwrap();
        store.save(&order_c).await.unwrap();

        let open = store.open_orders_only("bot-1").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].ticket, 1);
    }
}
