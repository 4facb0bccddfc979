//! In-memory broker terminal, used by every crate's tests and by the
//! default `new_backend()` on any platform lacking the real terminal.
//!
//! Mirrors `gridloop-gateway-dll`'s mock/FFI split (real backend gated
//! behind `#[cfg(all(target_os = "windows", feature = "real_dll"))]`,
//! mock otherwise) at this crate's MT5-flavoured contract instead of
//! `gridloop-gateway-dll`'s tick/order-book event stream.

use crate::error::{GatewayError, RETCODE_DONE};
use crate::trait_def::BrokerGateway;
use crate::types::{AccountInfo, PendingOrder, Position};
use async_trait::async_trait;
use gridloop_markets::{
    stop_loss_price, take_profit_price, truncate_comment, Candle, Side, SlTpUnit, SymbolInfo,
    Timeframe,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

struct MockState {
    connected: bool,
    account: AccountInfo,
    symbols: HashMap<String, SymbolInfo>,
    positions: HashMap<i64, Position>,
    pending: HashMap<i64, PendingOrder>,
    history_closed: HashSet<i64>,
    candles: HashMap<(String, Timeframe), Vec<Candle>>,
    next_ticket: i64,
    reject_next_order: bool,
    last_comment: Option<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connected: false,
            account: AccountInfo {
                balance: Decimal::ZERO,
                equity: Decimal::ZERO,
                margin: Decimal::ZERO,
                free_margin: Decimal::ZERO,
                profit: Decimal::ZERO,
                login: 0,
            },
            symbols: HashMap::new(),
            positions: HashMap::new(),
            pending: HashMap::new(),
            history_closed: HashSet::new(),
            candles: HashMap::new(),
            next_ticket: 1,
            reject_next_order: false,
            last_comment: None,
        }
    }
}

/// An in-process broker terminal: symbols, open positions, pending
/// orders and candle series all live in memory, guarded by a single
/// synchronous mutex (cheap enough not to need an async one, since no
/// method here ever awaits while holding it).
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/fixture hook: registers or updates a symbol's tick snapshot.
    pub fn set_symbol(&self, symbol: &str, info: SymbolInfo) {
        self.state.lock().symbols.insert(symbol.to_string(), info);
    }

    /// Test/fixture hook: moves the bid/ask of an already-registered
    /// symbol, keeping its `point`/`spread` unchanged.
    pub fn set_bid(&self, symbol: &str, bid: Decimal) {
        let mut state = self.state.lock();
        if let Some(info) = state.symbols.get_mut(symbol) {
            let spread = info.ask - info.bid;
            info.bid = bid;
            info.ask = bid + spread;
        }
    }

    /// Test/fixture hook: appends a candle to a symbol/timeframe series.
    pub fn push_candle(&self, symbol: &str, timeframe: Timeframe, candle: Candle) {
        self.state
            .lock()
            .candles
            .entry((symbol.to_string(), timeframe))
            .or_default()
            .push(candle);
    }

    /// Test hook: the next `market`/`pending` call returns
    /// [`GatewayError::OrderRejected`] instead of succeeding (§7, §8 S-series
    /// broker-rejection scenarios).
    pub fn force_next_order_rejection(&self) {
        self.state.lock().reject_next_order = true;
    }

    /// Test hook: directly seeds an open position without going through
    /// `market`, for reconciliation/suspicious-order fixtures (§4.7, S4).
    pub fn seed_position(&self, position: Position) {
        self.state.lock().positions.insert(position.ticket, position);
    }

    /// Test hook: marks a ticket present in the broker's trade history,
    /// independent of whether it is still tracked as open (§4.1
    /// `CheckIsClosed`).
    pub fn seed_history(&self, ticket: i64) {
        self.state.lock().history_closed.insert(ticket);
    }

    /// Test hook: the most recently truncated order comment (§8 boundary
    /// behavior).
    pub fn last_comment(&self) -> Option<String> {
        self.state.lock().last_comment.clone()
    }

    pub fn set_account(&self, account: AccountInfo) {
        self.state.lock().account = account;
    }

    fn next_ticket(state: &mut MockState) -> i64 {
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        ticket
    }
}

#[async_trait]
impl BrokerGateway for MockGateway {
    async fn initialize(&self, _path: Option<&str>) -> Result<(), GatewayError> {
        self.state.lock().connected = true;
        Ok(())
    }

    async fn login(
        &self,
        _user: &str,
        _password: Option<&str>,
        _server: Option<&str>,
    ) -> Result<bool, GatewayError> {
        self.state.lock().connected = true;
        Ok(true)
    }

    async fn account_info(&self) -> Result<Option<AccountInfo>, GatewayError> {
        let state = self.state.lock();
        Ok(state.connected.then_some(state.account))
    }

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, GatewayError> {
        Ok(self.state.lock().symbols.get(symbol).copied())
    }

    async fn bid(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError> {
        Ok(self.symbol_info(symbol).await?.map(|info| info.bid))
    }

    async fn ask(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError> {
        Ok(self.symbol_info(symbol).await?.map(|info| info.ask))
    }

    async fn market(
        &self,
        side: Side,
        symbol: &str,
        volume: Decimal,
        magic: i64,
        sl: Decimal,
        tp: Decimal,
        sltp_kind: SlTpUnit,
        _slippage: i32,
        comment: &str,
    ) -> Result<Vec<Position>, GatewayError> {
        let truncated = truncate_comment(comment);
        let mut state = self.state.lock();
        state.last_comment = Some(truncated);

        if state.reject_next_order {
            state.reject_next_order = false;
            return Err(GatewayError::OrderRejected { retcode: RETCODE_DONE + 1 });
        }

        let info = *state
            .symbols
            .get(symbol)
            .ok_or_else(|| GatewayError::SymbolUnknown(symbol.to_string()))?;
        let open_price = match side {
            Side::Buy => info.ask,
            Side::Sell => info.bid,
        };
        let sl_distance = info.distance(sl, sltp_kind);
        let tp_distance = info.distance(tp, sltp_kind);

        let ticket = Self::next_ticket(&mut state);
        let position = Position {
            ticket,
            magic,
            side,
            volume,
            open_price,
            sl: stop_loss_price(side, open_price, sl_distance),
            tp: take_profit_price(side, open_price, tp_distance),
            swap: Decimal::ZERO,
            commission: Decimal::ZERO,
            profit: Decimal::ZERO,
        };
        state.positions.insert(ticket, position);
        Ok(vec![position])
    }

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
        _slippage: i32,
        comment: &str,
    ) -> Result<Vec<PendingOrder>, GatewayError> {
        let truncated = truncate_comment(comment);
        let mut state = self.state.lock();
        state.last_comment = Some(truncated);

        if state.reject_next_order {
            state.reject_next_order = false;
            return Err(GatewayError::OrderRejected { retcode: RETCODE_DONE + 1 });
        }

        let info = *state
            .symbols
            .get(symbol)
            .ok_or_else(|| GatewayError::SymbolUnknown(symbol.to_string()))?;
        let sl_distance = info.distance(sl, sltp_kind);
        let tp_distance = info.distance(tp, sltp_kind);

        let ticket = Self::next_ticket(&mut state);
        let order = PendingOrder {
            ticket,
            magic,
            side,
            volume,
            price,
            sl: stop_loss_price(side, price, sl_distance),
            tp: take_profit_price(side, price, tp_distance),
        };
        state.pending.insert(ticket, order);
        Ok(vec![order])
    }

    async fn close_position(&self, ticket: i64, _deviation: i32) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state
            .positions
            .remove(&ticket)
            .ok_or(GatewayError::TicketNotFound(ticket))?;
        state.history_closed.insert(ticket);
        Ok(())
    }

    async fn close_order(&self, ticket: i64) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state
            .pending
            .remove(&ticket)
            .ok_or(GatewayError::TicketNotFound(ticket))?;
        Ok(())
    }

    async fn position_by_ticket(&self, ticket: i64) -> Result<Option<Position>, GatewayError> {
        Ok(self.state.lock().positions.get(&ticket).copied())
    }

    async fn order_by_ticket(&self, ticket: i64) -> Result<Option<PendingOrder>, GatewayError> {
        Ok(self.state.lock().pending.get(&ticket).copied())
    }

    async fn all_positions(&self) -> Result<Vec<Position>, GatewayError> {
        Ok(self.state.lock().positions.values().copied().collect())
    }

    async fn all_orders(&self) -> Result<Vec<PendingOrder>, GatewayError> {
        Ok(self.state.lock().pending.values().copied().collect())
    }

    async fn check_is_pending(&self, ticket: i64) -> Result<bool, GatewayError> {
        Ok(self.state.lock().pending.contains_key(&ticket))
    }

    async fn check_is_closed(&self, ticket: i64) -> Result<bool, GatewayError> {
        let state = self.state.lock();
        Ok(!state.positions.contains_key(&ticket)
            && !state.pending.contains_key(&ticket)
            && state.history_closed.contains(&ticket))
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        n: usize,
    ) -> Result<Vec<Candle>, GatewayError> {
        let state = self.state.lock();
        let Some(series) = state.candles.get(&(symbol.to_string(), timeframe)) else {
            return Ok(Vec::new());
        };
        let start = series.len().saturating_sub(n);
        Ok(series[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_markets::SymbolInfo;
    use rust_decimal_macros::dec;

    fn symbol_info() -> SymbolInfo {
        SymbolInfo {
            point: dec!(0.00001),
            spread: dec!(0.00002),
            bid: dec!(1.10000),
            ask: dec!(1.10002),
        }
    }

    #[tokio::test]
    async fn market_order_opens_a_position_with_converted_sl_tp() {
        let gateway = MockGateway::new();
        gateway.initialize(None).await.unwrap();
        gateway.set_symbol("EURUSD", symbol_info());

        let positions = gateway
            .market(
                Side::Buy,
                "EURUSD",
                dec!(0.01),
                12345,
                dec!(50),
                dec!(0),
                SlTpUnit::Pips,
                5,
                "cycle open",
            )
            .await
            .unwrap();

        assert_eq!(positions.len(), 1);
        let position = positions[0];
        assert_eq!(position.open_price, dec!(1.10002));
        // 50 pips = 50 * 0.0001 = 0.005 below the buy open price.
        assert_eq!(position.sl, Some(dec!(1.09502)));
        assert_eq!(position.tp, None);
    }

    #[tokio::test]
    async fn rejected_order_never_creates_a_position() {
        let gateway = MockGateway::new();
        gateway.set_symbol("EURUSD", symbol_info());
        gateway.force_next_order_rejection();

        let result = gateway
            .market(
                Side::Buy,
                "EURUSD",
                dec!(0.01),
                1,
                dec!(0),
                dec!(0),
                SlTpUnit::Pips,
                5,
                "x",
            )
            .await;

        assert!(matches!(result, Err(GatewayError::OrderRejected { .. })));
        assert!(gateway.all_positions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_longer_than_thirty_chars_is_truncated() {
        let gateway = MockGateway::new();
        gateway.set_symbol("EURUSD", symbol_info());
        let long_comment = "a".repeat(45);

        gateway
            .market(
                Side::Buy,
                "EURUSD",
                dec!(0.01),
                1,
                dec!(0),
                dec!(0),
                SlTpUnit::Pips,
                5,
                &long_comment,
            )
            .await
            .unwrap();

        assert_eq!(gateway.last_comment().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn check_is_closed_requires_absence_from_active_sets_and_history_presence() {
        let gateway = MockGateway::new();
        gateway.seed_history(99);
        assert!(gateway.check_is_closed(99).await.unwrap());

        gateway.seed_position(Position {
            ticket: 100,
            magic: 1,
            side: Side::Buy,
            volume: dec!(0.01),
            open_price: dec!(1.1),
            sl: None,
            tp: None,
            swap: Decimal::ZERO,
            commission: Decimal::ZERO,
            profit: Decimal::ZERO,
        });
        gateway.seed_history(100);
        assert!(!gateway.check_is_closed(100).await.unwrap());
    }

    #[tokio::test]
    async fn candles_returns_the_most_recent_n_in_order() {
        let gateway = MockGateway::new();
        let base = chrono::Utc::now();
        for i in 0..5i64 {
            gateway.push_candle(
                "EURUSD",
                Timeframe::H1,
                Candle {
                    open_time: base + chrono::Duration::hours(i),
                    open: dec!(1.1),
                    high: dec!(1.11),
                    low: dec!(1.09),
                    close: dec!(1.105),
                },
            );
        }
        let last_two = gateway.candles("EURUSD", Timeframe::H1, 2).await.unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[1].open_time, base + chrono::Duration::hours(4));
    }
}
