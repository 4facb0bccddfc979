//! Pip/point conversion. A *pip* is ten times the symbol's native point
//! unit and is the canonical price-move unit used throughout the cycle
//! engine (see GLOSSARY).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Static per-symbol metadata returned by `SymbolInfo` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub point: Decimal,
    pub spread: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
}

impl SymbolInfo {
    /// A pip equals ten times the symbol's point (§4.1).
    pub fn pip(&self) -> Decimal {
        self.point * Decimal::from(10)
    }

    /// Converts a distance expressed in the given unit into an absolute
    /// price distance, per the SL/TP semantics in §4.1.
    pub fn distance(&self, amount: Decimal, unit: SlTpUnit) -> Decimal {
        match unit {
            SlTpUnit::Points => amount * self.point,
            SlTpUnit::Pips => amount * self.pip(),
            SlTpUnit::Price => amount,
        }
    }
}

/// The unit an SL/TP distance is expressed in when placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlTpUnit {
    Points,
    Pips,
    Price,
}

/// Computes the absolute SL price for a given side. A zero `distance`
/// means "no SL", per the boundary behavior in §8.
pub fn stop_loss_price(side: crate::Side, open_price: Decimal, distance: Decimal) -> Option<Decimal> {
    if distance.is_zero() {
        return None;
    }
    Some(match side {
        crate::Side::Buy => open_price - distance,
        crate::Side::Sell => open_price + distance,
    })
}

/// Computes the absolute TP price for a given side, mirroring
/// [`stop_loss_price`] (§4.1: "TP mirrors").
pub fn take_profit_price(side: crate::Side, open_price: Decimal, distance: Decimal) -> Option<Decimal> {
    if distance.is_zero() {
        return None;
    }
    Some(match side {
        crate::Side::Buy => open_price + distance,
        crate::Side::Sell => open_price - distance,
    })
}

/// Truncates a broker comment to the 30-character limit (§4.1, §8).
pub fn truncate_comment(comment: &str) -> String {
    comment.chars().take(30).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;
    use rust_decimal_macros::dec;

    fn symbol() -> SymbolInfo {
        SymbolInfo {
            point: dec!(0.00001),
            spread: dec!(0.00002),
            bid: dec!(1.10000),
            ask: dec!(1.10002),
        }
    }

    #[test]
    fn pip_is_ten_times_point() {
        assert_eq!(symbol().pip(), dec!(0.00010));
    }

    #[test]
    fn zero_distance_means_unset() {
        assert_eq!(stop_loss_price(Side::Buy, dec!(1.10000), dec!(0)), None);
        assert_eq!(take_profit_price(Side::Sell, dec!(1.10000), dec!(0)), None);
    }

    #[test]
    fn buy_sl_is_below_market_sell_sl_is_above() {
        assert_eq!(
            stop_loss_price(Side::Buy, dec!(1.10000), dec!(0.00050)),
            Some(dec!(1.09950))
        );
        assert_eq!(
            stop_loss_price(Side::Sell, dec!(1.10000), dec!(0.00050)),
            Some(dec!(1.10050))
        );
    }

    #[test]
    fn comment_truncates_to_thirty_chars() {
        let long = "a".repeat(45);
        assert_eq!(truncate_comment(&long).len(), 30);
    }
}
