//! Wire types returned across the Broker Gateway boundary (§4.1).

use gridloop_markets::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of the logged-in broker account (`AccountInfo`, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: Decimal,
    pub equity: Decimal,
    pub margin: Decimal,
    pub free_margin: Decimal,
    pub profit: Decimal,
    pub login: i64,
}

/// One open broker position, returned by `Market`, `PositionByTicket` and
/// `AllPositions` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticket: i64,
    pub magic: i64,
    pub side: Side,
    pub volume: Decimal,
    pub open_price: Decimal,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
    pub swap: Decimal,
    pub commission: Decimal,
    pub profit: Decimal,
}

/// One resting (pending) broker order, returned by `Pending`,
/// `OrderByTicket` and `AllOrders` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub ticket: i64,
    pub magic: i64,
    pub side: Side,
    pub volume: Decimal,
    pub price: Decimal,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
}

/// Maximum broker comment length before truncation (§4.1, §8).
pub const MAX_COMMENT_LEN: usize = 30;
