//! The Broker Gateway contract (§4.1): a thin, typed, purely async facade
//! over the broker terminal's native API (session, symbol/tick, order
//! entry, position/history lookup, candle retrieval).
//!
//! Mirrors the shape of `gridloop-gateway-dll`'s `ProfitBackend` trait
//! (one method per broker operation, real/mock split behind a feature
//! flag) but speaks the MT5-flavoured vocabulary this orchestrator's
//! cycles are built around: positions, pending orders, magic numbers,
//! SL/TP, and `M1..MN1` candle timeframes, rather than `gridloop-gateway-dll`'s
//! tick/order-book event stream.

use crate::error::GatewayError;
use crate::types::{AccountInfo, PendingOrder, Position};
use async_trait::async_trait;
use gridloop_markets::{Candle, CandleDirection, Side, SlTpUnit, SymbolInfo, Timeframe};
use rust_decimal::Decimal;

/// Object-safe facade over the broker terminal (§4.1).
///
/// Every method is a single synchronous-shaped broker call modelled as
/// `async fn` so the Strategy Loop, Reconciliation service and Account
/// Supervisor can all share one connection without blocking each other's
/// executor thread while the call is in flight (§5).
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// `Initialize(path?)` (§4.1). Returns [`GatewayError::ConnectionFailed`]
    /// if launch fails.
    async fn initialize(&self, path: Option<&str>) -> Result<(), GatewayError>;

    /// `Login(user, pass?, server?)` (§4.1).
    async fn login(
        &self,
        user: &str,
        password: Option<&str>,
        server: Option<&str>,
    ) -> Result<bool, GatewayError>;

    /// `AccountInfo` (§4.1). `None` if disconnected.
    async fn account_info(&self) -> Result<Option<AccountInfo>, GatewayError>;

    /// `SymbolInfo(s)` (§4.1). `None` if the symbol is unknown or
    /// unavailable.
    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, GatewayError>;

    /// `Bid(s)` (§4.1).
    async fn bid(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError>;

    /// `Ask(s)` (§4.1).
    async fn ask(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError>;

    /// `Market(side, s, vol, magic, sl, tp, sltpKind, slippage, comment)`
    /// (§4.1). `sl`/`tp` of zero mean "unset" (§8). The comment is
    /// truncated to 30 characters before submission. Returns the
    /// confirmed position(s) on the broker's "done" retcode, or
    /// [`GatewayError::OrderRejected`] otherwise — the cycle engine never
    /// records a ticket it did not receive back (§4.5.5).
    #[allow(clippy::too_many_arguments)]
    async fn market(
        &self,
        side: Side,
        symbol: &str,
        volume: Decimal,
        magic: i64,
        sl: Decimal,
        tp: Decimal,
        sltp_kind: SlTpUnit,
        slippage: i32,
        comment: &str,
    ) -> Result<Vec<Position>, GatewayError>;

    /// `Pending(side, s, price, vol, magic, sl, tp, sltpKind, slippage,
    /// comment)` (§4.1), same SL/TP and comment handling as [`Self::market`].
    #[allow(clippy::too_many_arguments)]
    async fn pending(
        &self,
        side: Side,
        symbol: &str,
        price: Decimal,
        volume: Decimal,
        magic: i64,
        sl: Decimal,
        tp: Decimal,
        sltp_kind: SlTpUnit,
        slippage: i32,
        comment: &str,
    ) -> Result<Vec<PendingOrder>, GatewayError>;

    /// `ClosePosition(pos, deviation)` (§4.1).
    async fn close_position(&self, ticket: i64, deviation: i32) -> Result<(), GatewayError>;

    /// `CloseOrder(order_or_ticket)` (§4.1) — cancels a resting order.
    async fn close_order(&self, ticket: i64) -> Result<(), GatewayError>;

    /// `PositionByTicket` (§4.1).
    async fn position_by_ticket(&self, ticket: i64) -> Result<Option<Position>, GatewayError>;

    /// `OrderByTicket` (§4.1).
    async fn order_by_ticket(&self, ticket: i64) -> Result<Option<PendingOrder>, GatewayError>;

    /// `AllPositions` (§4.1).
    async fn all_positions(&self) -> Result<Vec<Position>, GatewayError>;

    /// `AllOrders` (§4.1).
    async fn all_orders(&self) -> Result<Vec<PendingOrder>, GatewayError>;

    /// `CheckIsPending(t)` (§4.1).
    async fn check_is_pending(&self, ticket: i64) -> Result<bool, GatewayError>;

    /// `CheckIsClosed(t)` (§4.1): `true` only if `ticket` is absent from
    /// both active positions and pending orders AND present in the
    /// broker's trade history.
    async fn check_is_closed(&self, ticket: i64) -> Result<bool, GatewayError>;

    /// `Candles(s, tf, n)` (§4.1), most recent last.
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        n: usize,
    ) -> Result<Vec<Candle>, GatewayError>;

    /// `LastCandle(s, tf)` (§4.1).
    async fn last_candle(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<Candle>, GatewayError> {
        Ok(self.candles(symbol, timeframe, 1).await?.into_iter().next_back())
    }

    /// `CandleDirection(s, tf)` (§4.1).
    async fn candle_direction(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<CandleDirection>, GatewayError> {
        Ok(self
            .last_candle(symbol, timeframe)
            .await?
            .and_then(|candle| candle.direction()))
    }
}
