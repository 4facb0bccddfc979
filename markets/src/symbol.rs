use crate::kind::CandleDirection;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLC candle as returned by `Candles`/`LastCandle` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    /// `None` when open == close; the engine only acts on a strict
    /// bullish/bearish close (§4.5.2 item 7, §8).
    pub fn direction(&self) -> Option<CandleDirection> {
        if self.close > self.open {
            Some(CandleDirection::Up)
        } else if self.close < self.open {
            Some(CandleDirection::Down)
        } else {
            None
        }
    }
}

/// Per-account snapshot of a tradable symbol and its last known bid (§3,
/// "Symbol").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: Option<String>,
    pub account_id: String,
    pub name: String,
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle_at(open: Decimal, close: Decimal) -> Candle {
        Candle {
            open_time: Utc::now(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
        }
    }

    #[test]
    fn flat_candle_has_no_direction() {
        assert_eq!(candle_at(dec!(1.1), dec!(1.1)).direction(), None);
    }

    #[test]
    fn bullish_and_bearish_candles() {
        assert_eq!(candle_at(dec!(1.1), dec!(1.2)).direction(), Some(CandleDirection::Up));
        assert_eq!(candle_at(dec!(1.2), dec!(1.1)).direction(), Some(CandleDirection::Down));
    }
}
