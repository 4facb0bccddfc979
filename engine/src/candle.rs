//! Candle-close trading: opening a fresh cycle around the close of a
//! newly completed candle (CycleTrader opt-in).

use crate::cycle::Cycle;
use crate::error::EngineError;
use gridloop_gateway::BrokerGateway;
use gridloop_markets::{CandleDirection, CycleKind, OpenedBy, Side, SlTpUnit, StrategyConfig};
use rust_decimal::Decimal;

/// Opens one market order in the direction of `direction`, a matching
/// pending hedge at `hedge_sl` pips on the opposite side, and wraps both
/// in a new cycle. Returns `None` if the broker rejects the market leg;
/// the pending hedge is only attempted once the market leg is confirmed.
#[allow(clippy::too_many_arguments)]
pub async fn open_candle_close_cycle(
    gateway: &dyn BrokerGateway,
    id: impl Into<String>,
    bot_id: &str,
    account_id: &str,
    symbol: &str,
    magic: i64,
    direction: CandleDirection,
    pip: Decimal,
    config: &StrategyConfig,
) -> Result<Option<Cycle>, EngineError> {
    let side = match direction {
        CandleDirection::Up => Side::Buy,
        CandleDirection::Down => Side::Sell,
    };
    let kind = match side {
        Side::Buy => CycleKind::Buy,
        Side::Sell => CycleKind::Sell,
    };

    let positions = match gateway
        .market(
            side,
            symbol,
            config.lot_size,
            magic,
            Decimal::ZERO,
            Decimal::ZERO,
            SlTpUnit::Pips,
            config.slippage,
            "candle_close",
        )
        .await
    {
        Ok(positions) => positions,
        Err(error) => {
            tracing::warn!(%symbol, %error, "candle-close market order rejected by broker");
            return Ok(None);
        }
    };
    let Some(entry) = positions.into_iter().next() else {
        return Ok(None);
    };

    let mut cycle = Cycle::open(
        id,
        bot_id,
        account_id,
        symbol,
        magic,
        kind,
        side,
        entry.open_price,
        entry.ticket,
        entry.volume,
        pip,
        config.zone_pips,
        config.zone_forward2_pips,
        OpenedBy::engine(),
    );

    let hedge_side = side.flipped();
    match gateway
        .pending(
            hedge_side,
            symbol,
            match side {
                Side::Buy => entry.open_price - config.hedge_sl_pips * pip,
                Side::Sell => entry.open_price + config.hedge_sl_pips * pip,
            },
            config.lot_size,
            magic,
            Decimal::ZERO,
            Decimal::ZERO,
            SlTpUnit::Pips,
            config.slippage,
            "candle_close_hedge",
        )
        .await
    {
        Ok(orders) => {
            for order in orders {
                cycle.pending.push(order.ticket);
                cycle.active_orders.push(order.ticket);
            }
        }
        Err(error) => {
            tracing::warn!(%symbol, %error, "candle-close hedge pending order rejected by broker");
        }
    }

    Ok(Some(cycle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_gateway::MockGateway;
    use gridloop_markets::SymbolInfo;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn bullish_candle_opens_a_buy_cycle_with_a_sell_stop_hedge() {
        let gateway = MockGateway::new();
        gateway.set_symbol(
            "EURUSD",
            SymbolInfo {
                point: dec!(0.00001),
                spread: dec!(0.00002),
                bid: dec!(1.10000),
                ask: dec!(1.10002),
            },
        );
        let config = StrategyConfig {
            hedge_sl_pips: dec!(100),
            ..StrategyConfig::default()
        };

        let cycle = open_candle_close_cycle(
            &gateway,
            "cycle-1",
            "bot-1",
            "acct-1",
            "EURUSD",
            1,
            CandleDirection::Up,
            dec!(0.0001),
            &config,
        )
        .await
        .unwrap()
        .expect("market leg succeeds");

        assert_eq!(cycle.current_direction, Side::Buy);
        assert_eq!(cycle.pending.len(), 1);
        assert_eq!(cycle.active_orders.len(), 2);
    }
}
