//! Configuration record for one strategy instance on one account (§3, "Bot").

use crate::kind::{SltpKind, StrategyKind, Timeframe};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The strategy-specific grid/hedge/candle parameters a [`Bot`] is
/// configured with (§4.5, §9 Open Questions 1-2).
///
/// Every field here is read by [`gridloop_markets`] downstream crates
/// (the engine, the strategy loop); fields a given [`StrategyKind`] does
/// not use are simply ignored rather than made family-specific types,
/// mirroring the source's single flat config map per bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Zone size `Z`, in pips (§4.5.1).
    pub zone_pips: Decimal,
    /// `zone_forward` — referenced in the manage-cycle call signature but
    /// not used in threshold computation; reserved for future use (§9 Open
    /// Question 2). Kept distinct from `zone_forward2` deliberately.
    pub zone_forward_pips: Decimal,
    /// `zone_forward2` — the distance actually used to compute
    /// `threshold_lower`/`threshold_upper` (§4.5.1, §9 Open Question 2).
    pub zone_forward2_pips: Decimal,
    /// Grid-step distance in pips (§4.5.2 item 2).
    pub pips_step: Decimal,
    /// Fixed lot size used when `lot_sequence` is empty.
    pub lot_size: Decimal,
    /// Lot size sequence indexed by `lot_idx`, used for hedge orders and
    /// recovery-mode sizing (§4.5.2 item 4). Empty means "always use
    /// `lot_size`".
    pub lot_sequence: Vec<Decimal>,
    pub max_cycles: usize,
    /// Unit `take_profit` (and the batch stop-loss cap) are denominated
    /// in (§9 Open Question 1).
    pub sltp: SltpKind,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Hedging/recovery opt-in (AdaptiveHedge, AdvancedCyclesTrader; §4.5.2
    /// item 4).
    pub hedge_enabled: bool,
    pub hedge_sl_pips: Decimal,
    /// Per-order loss threshold (in the account's quote currency) that
    /// trips recovery mode (§4.5.2 item 4).
    pub recovery_loss_threshold: Decimal,
    /// Batch stop-loss opt-in (AdvancedCyclesTrader; §4.5.2 item 5).
    pub batch_stop_loss_enabled: bool,
    pub batch_stop_loss_pips: Decimal,
    /// Candle-close trading opt-in (CycleTrader; §4.5.2 item 7).
    pub auto_candle_close: bool,
    pub candle_timeframe: Timeframe,
    /// Unlimited direction switches (MoveGuard; §4.5.2 item 3).
    pub unlimited_reversal: bool,
    /// `autotrade_threshold`, in pips — how far price must move from
    /// `last_cycle_price` before a new cycle may open (§4.5.4).
    pub autotrade_threshold_pips: Decimal,
    /// `autotrade_pips_restriction`; `0` disables both the proximity
    /// suppression and the level-buffer dedup scan (§4.5.4, §9 Open
    /// Question 4).
    pub autotrade_pips_restriction: i64,
    pub slippage: i32,
}

impl Default for StrategyConfig {
    /// Documented defaults a strategy falls back to on a missing or
    /// non-coercible parameter (§7 "Configuration" error class): a
    /// one-line warning is logged by the caller, not by this type.
    fn default() -> Self {
        Self {
            zone_pips: Decimal::from(500),
            zone_forward_pips: Decimal::ONE,
            zone_forward2_pips: Decimal::ONE,
            pips_step: Decimal::from(100),
            lot_size: Decimal::new(1, 2),
            lot_sequence: Vec::new(),
            max_cycles: 1,
            sltp: SltpKind::Money,
            take_profit: Decimal::from(5),
            stop_loss: Decimal::ZERO,
            hedge_enabled: false,
            hedge_sl_pips: Decimal::from(100),
            recovery_loss_threshold: Decimal::from(10),
            batch_stop_loss_enabled: false,
            batch_stop_loss_pips: Decimal::from(50),
            auto_candle_close: false,
            candle_timeframe: Timeframe::H1,
            unlimited_reversal: false,
            autotrade_threshold_pips: Decimal::from(100),
            autotrade_pips_restriction: 0,
            slippage: 5,
        }
    }
}

/// Runtime settings mutated by user events (`stop_bot`/`start_bot`; §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BotRuntime {
    pub stopped: bool,
}

/// Configuration record for one strategy instance on one account (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: String,
    pub account_id: String,
    pub strategy: StrategyKind,
    pub magic: i64,
    pub symbol: String,
    pub config: StrategyConfig,
    pub runtime: BotRuntime,
}

impl Bot {
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        strategy: StrategyKind,
        magic: i64,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            strategy,
            magic,
            symbol: symbol.into(),
            config: StrategyConfig::default(),
            runtime: BotRuntime::default(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.runtime.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bot_starts_unstopped_with_default_config() {
        let bot = Bot::new("bot-1", "acct-1", StrategyKind::CycleTrader, 12345, "EURUSD");
        assert!(!bot.is_stopped());
        assert_eq!(bot.config.max_cycles, 1);
    }
}
