//! Fieldless domain enums. Every wire boundary (local store column, remote
//! document field) represents these as lowercase strings, so they derive
//! [`gridloop_macros::SnakeCaseKind`] rather than hand-rolled `Display`/
//! `FromStr` pairs.

use gridloop_macros::SnakeCaseKind;

/// The five strategy families a [`crate::Bot`](crate) may run.
///
/// The Strategy Loop holds one of these per bot and dispatches on it for
/// the handful of family-specific hooks: hedging/recovery (AdaptiveHedge,
/// AdvancedCyclesTrader), batch stop-loss (AdvancedCyclesTrader), candle
/// trading (CycleTrader), unlimited reversal (MoveGuard).
#[derive(SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    AdaptiveHedge,
    CycleTrader,
    AdvancedCyclesTrader,
    MoveGuard,
    StockTrader,
}

/// The direction composition of a cycle as it was opened.
#[derive(SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKind {
    Buy,
    Sell,
    BuyAndSell,
}

/// A cycle's position in its state machine (§4.5.3).
#[derive(SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleStatus {
    Initial,
    Active,
    Recovery,
    Closed,
}

/// Unit that `take_profit` (and batch-stop-loss) figures are denominated
/// in. Selected per strategy config; see Open Question 1 in DESIGN.md.
#[derive(SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SltpKind {
    Money,
    Pips,
}

/// Market vs. resting order.
#[derive(SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Market,
    Pending,
}

/// Candle timeframe, as accepted by the broker's "copy rates" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction a completed candle closed in, used by the CycleTrader
/// candle-close opt-in (§4.5.2 item 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleDirection {
    Up,
    Down,
}

/// Who/what initiated an order or cycle, carried for audit purposes
/// (`opened_by` in §3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OpenedBy {
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub sent_by_admin: bool,
}

impl OpenedBy {
    pub fn engine() -> Self {
        Self {
            user_name: None,
            user_id: None,
            sent_by_admin: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_round_trips_through_snake_case() {
        for kind in [
            StrategyKind::AdaptiveHedge,
            StrategyKind::CycleTrader,
            StrategyKind::AdvancedCyclesTrader,
            StrategyKind::MoveGuard,
            StrategyKind::StockTrader,
        ] {
            let s = kind.to_string();
            let parsed: StrategyKind = s.parse().expect("round trip");
            assert_eq!(parsed, kind);
        }
        assert_eq!(StrategyKind::AdvancedCyclesTrader.to_string(), "advanced_cycles_trader");
    }

    #[test]
    fn cycle_status_serializes_lowercase() {
        let json = serde_json::to_string(&CycleStatus::Recovery).unwrap();
        assert_eq!(json, "\"recovery\"");
    }
}
