//! Gating checks applied by the Strategy Loop before opening a new cycle
//! (§4.5.4) and by the Cycle Engine before closing a batch (§4.5.2 item 5).
//!
//! Each check is a small, independently testable predicate rather than one
//! monolithic "can I open a cycle" function, following the same
//! `RiskCheck` shape the wider ecosystem uses for order-level risk gates.

use gridloop_markets::Side;
use rust_decimal::Decimal;
use thiserror::Error;

/// General interface for a single risk/gating predicate.
///
/// See [`CheckMaxCycles`], [`CheckAutotradeRestriction`],
/// [`CheckLevelDedup`] and [`CheckBatchStopLoss`] for the concrete checks
/// the engine composes on every tick.
pub trait RiskCheck {
    type Input;
    type Error;

    fn name() -> &'static str;
    fn check(&self, input: &Self::Input) -> Result<(), Self::Error>;
}

/// A read-only view of an active cycle, sufficient for the Strategy
/// Loop's autotrade-gating decisions without exposing the full cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSnapshot {
    pub direction: Side,
    pub open_price: Decimal,
    pub has_hedged: bool,
    pub closed_count: usize,
    pub orders_count: usize,
}

/// At most `max_cycles` unclosed cycles may exist at once per bot (§4.5.4).
#[derive(Debug, Clone, Copy, derive_more::Constructor)]
pub struct CheckMaxCycles {
    pub max_cycles: usize,
}

#[derive(Debug, Clone, Copy, Error)]
#[error("CheckMaxCycles failed: {active} active cycles >= max {max_cycles}")]
pub struct CheckMaxCyclesError {
    pub active: usize,
    pub max_cycles: usize,
}

impl RiskCheck for CheckMaxCycles {
    type Input = usize;
    type Error = CheckMaxCyclesError;

    fn name() -> &'static str {
        "CheckMaxCycles"
    }

    fn check(&self, active_cycles: &usize) -> Result<(), Self::Error> {
        if *active_cycles >= self.max_cycles {
            Err(CheckMaxCyclesError {
                active: *active_cycles,
                max_cycles: self.max_cycles,
            })
        } else {
            Ok(())
        }
    }
}

/// Input for [`CheckAutotradeRestriction`]: the candidate entry price, the
/// symbol's pip size, and the bot's currently active cycles.
#[derive(Debug, Clone, Copy)]
pub struct AutotradeRestrictionInput<'a> {
    // NB: deliberately not a `RiskCheck::Input` — see `check_against`.
    pub candidate_price: Decimal,
    pub pip: Decimal,
    pub cycles: &'a [CycleSnapshot],
}

/// Suppresses a new cycle when any existing cycle's open price lies
/// within `autotrade_pips_restriction / 2` pips of the candidate price
/// AND that cycle has not yet hedged, closed anything, or accumulated
/// more than two orders (§4.5.4).
///
/// `restriction_pips <= 0` disables the check entirely.
#[derive(Debug, Clone, Copy, derive_more::Constructor)]
pub struct CheckAutotradeRestriction {
    pub restriction_pips: i64,
}

#[derive(Debug, Clone, Copy, Error)]
#[error("CheckAutotradeRestriction failed: candidate within restricted band of an existing cycle")]
pub struct CheckAutotradeRestrictionError;

impl CheckAutotradeRestriction {
    /// Not a [`RiskCheck`] impl: the trait's associated `Input` type can't
    /// carry the borrow's lifetime, and this predicate needs one (it reads
    /// a caller-owned slice of [`CycleSnapshot`]s rather than an owned
    /// value).
    pub fn check_against(
        &self,
        input: &AutotradeRestrictionInput<'_>,
    ) -> Result<(), CheckAutotradeRestrictionError> {
        if self.restriction_pips <= 0 {
            return Ok(());
        }
        let half_band = input.pip * Decimal::from(self.restriction_pips) / Decimal::from(2);
        let restricted = input.cycles.iter().any(|cycle| {
            !cycle.has_hedged
                && cycle.closed_count == 0
                && cycle.orders_count <= 2
                && (cycle.open_price - input.candidate_price).abs() <= half_band
        });
        if restricted {
            Err(CheckAutotradeRestrictionError)
        } else {
            Ok(())
        }
    }
}

/// Suppresses a new cycle when an existing cycle of the *same direction*
/// already sits within the level buffer `autotrade_pips_restriction` pips
/// of the candidate price (§4.5.4, the "level-buffer" scan; see S5).
#[derive(Debug, Clone, Copy, derive_more::Constructor)]
pub struct CheckLevelDedup {
    pub level_buffer_pips: i64,
}

#[derive(Debug, Clone, Copy, Error)]
#[error("CheckLevelDedup failed: a {direction} cycle already exists within the level buffer")]
pub struct CheckLevelDedupError {
    pub direction: Side,
}

/// Input for [`CheckLevelDedup`].
#[derive(Debug, Clone, Copy)]
pub struct LevelDedupInput<'a> {
    pub direction: Side,
    pub candidate_price: Decimal,
    pub pip: Decimal,
    pub cycles: &'a [CycleSnapshot],
}

impl CheckLevelDedup {
    pub fn check_against(&self, input: &LevelDedupInput<'_>) -> Result<(), CheckLevelDedupError> {
        if self.level_buffer_pips <= 0 {
            return Ok(());
        }
        let band = input.pip * Decimal::from(self.level_buffer_pips);
        let clash = input.cycles.iter().any(|cycle| {
            cycle.direction == input.direction
                && (cycle.open_price - input.candidate_price).abs() <= band
        });
        if clash {
            Err(CheckLevelDedupError {
                direction: input.direction,
            })
        } else {
            Ok(())
        }
    }
}

/// Trips when the cumulative loss of the current batch exceeds
/// `batch_stop_loss_pips * pip * volume_sum` (§4.5.2 item 5).
#[derive(Debug, Clone, Copy, derive_more::Constructor)]
pub struct CheckBatchStopLoss {
    pub batch_stop_loss_pips: Decimal,
}

#[derive(Debug, Clone, Copy, Error)]
#[error("CheckBatchStopLoss tripped: loss {loss} exceeds cap {cap}")]
pub struct CheckBatchStopLossError {
    pub loss: Decimal,
    pub cap: Decimal,
}

/// Input for [`CheckBatchStopLoss`].
#[derive(Debug, Clone, Copy)]
pub struct BatchStopLossInput {
    pub pip: Decimal,
    pub volume_sum: Decimal,
    pub batch_loss: Decimal,
}

impl CheckBatchStopLoss {
    pub fn check_against(&self, input: &BatchStopLossInput) -> Result<(), CheckBatchStopLossError> {
        let cap = self.batch_stop_loss_pips * input.pip * input.volume_sum;
        if input.batch_loss.abs() > cap {
            Err(CheckBatchStopLossError {
                loss: input.batch_loss,
                cap,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cycle(direction: Side, open_price: Decimal) -> CycleSnapshot {
        CycleSnapshot {
            direction,
            open_price,
            has_hedged: false,
            closed_count: 0,
            orders_count: 1,
        }
    }

    #[test]
    fn max_cycles_trips_at_the_configured_limit() {
        let check = CheckMaxCycles::new(1);
        assert!(check.check(&0).is_ok());
        assert!(check.check(&1).is_err());
    }

    #[test]
    fn autotrade_restriction_suppresses_close_reentry_s5() {
        let check = CheckAutotradeRestriction::new(100);
        let cycles = [cycle(Side::Buy, dec!(1.10000))];

        // 50 pips away: suppressed.
        let close = AutotradeRestrictionInput {
            candidate_price: dec!(1.10050),
            pip: dec!(0.00010),
            cycles: &cycles,
        };
        assert!(check.check_against(&close).is_err());
    }

    #[test]
    fn batch_stop_loss_trips_past_the_cap() {
        let check = CheckBatchStopLoss::new(dec!(50));
        let input = BatchStopLossInput {
            pip: dec!(0.0001),
            volume_sum: dec!(1.0),
            batch_loss: dec!(-6.0),
        };
        // cap = 50 * 0.0001 * 1.0 = 0.005, loss magnitude 6.0 far exceeds it.
        assert!(check.check_against(&input).is_err());
    }
}
