//! Autotrade gating (§4.5.4): whether the Strategy Loop may open a new
//! cycle this tick. Reads [`gridloop_engine::Cycle`] fields but the
//! decision itself lives here, at the Strategy Loop level, per §4.5.4's
//! framing ("The Strategy Loop may open a new cycle when...").

use gridloop_engine::Cycle;
use gridloop_markets::{Side, StrategyConfig};
use gridloop_risk::{
    AutotradeRestrictionInput, CheckAutotradeRestriction, CheckLevelDedup, CheckMaxCycles,
    CycleSnapshot, LevelDedupInput, RiskCheck,
};
use rust_decimal::Decimal;

fn snapshot(cycle: &Cycle) -> CycleSnapshot {
    CycleSnapshot {
        direction: cycle.current_direction,
        open_price: cycle.open_price,
        has_hedged: !cycle.hedge.is_empty(),
        closed_count: cycle.closed.len(),
        orders_count: cycle.active_orders.len() + cycle.closed.len(),
    }
}

/// Whether a new cycle of `direction` at `candidate_price` may be opened
/// given the bot's currently active `cycles` (§4.5.4): distance from
/// `last_cycle_price`, proximity-restriction suppression, same-direction
/// level-buffer dedup, and the `max_cycles` cap, all four checked in that
/// order so the cheapest/most informative failure surfaces first.
pub fn may_open_new_cycle(
    config: &StrategyConfig,
    cycles: &[Cycle],
    last_cycle_price: Option<Decimal>,
    candidate_price: Decimal,
    direction: Side,
    pip: Decimal,
) -> bool {
    if let Some(last) = last_cycle_price {
        let moved = (candidate_price - last).abs();
        if moved < config.autotrade_threshold_pips * pip {
            return false;
        }
    }

    let snapshots: Vec<CycleSnapshot> = cycles.iter().map(snapshot).collect();

    let restriction = CheckAutotradeRestriction::new(config.autotrade_pips_restriction);
    if restriction
        .check_against(&AutotradeRestrictionInput {
            candidate_price,
            pip,
            cycles: &snapshots,
        })
        .is_err()
    {
        return false;
    }

    let dedup = CheckLevelDedup::new(config.autotrade_pips_restriction);
    if dedup
        .check_against(&LevelDedupInput {
            direction,
            candidate_price,
            pip,
            cycles: &snapshots,
        })
        .is_err()
    {
        return false;
    }

    let max_cycles = CheckMaxCycles::new(config.max_cycles);
    max_cycles.check(&cycles.len()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridloop_markets::{CycleKind, OpenedBy};
    use rust_decimal_macros::dec;

    fn cycle_at(open_price: Decimal, direction: Side) -> Cycle {
        let mut cycle = Cycle::open(
            "c",
            "bot-1",
            "acct-1",
            "EURUSD",
            1,
            CycleKind::Buy,
            direction,
            open_price,
            1,
            dec!(0.01),
            dec!(0.0001),
            dec!(500),
            dec!(1),
            OpenedBy::engine(),
        );
        cycle.current_direction = direction;
        cycle
    }

    #[test]
    fn s5_autotrade_level_dedup_suppresses_close_reentry_but_allows_far_entry() {
        let config = StrategyConfig {
            autotrade_pips_restriction: 100,
            autotrade_threshold_pips: dec!(1),
            max_cycles: 10,
            ..StrategyConfig::default()
        };
        let cycles = vec![cycle_at(dec!(1.10000), Side::Buy)];
        let pip = dec!(0.0001);

        // restriction=100 at pip=0.0001 bands +/-0.005 (proximity restriction)
        // and +/-0.01 (same-direction level dedup) around 1.10000; 1.10050
        // falls inside both (suppressed), 1.11500 clears both (allowed).
        assert!(!may_open_new_cycle(&config, &cycles, None, dec!(1.10050), Side::Buy, pip));
        assert!(may_open_new_cycle(&config, &cycles, None, dec!(1.11500), Side::Buy, pip));
    }

    #[test]
    fn max_cycles_caps_regardless_of_distance() {
        let config = StrategyConfig {
            max_cycles: 1,
            autotrade_pips_restriction: 0,
            autotrade_threshold_pips: dec!(0),
            ..StrategyConfig::default()
        };
        let cycles = vec![cycle_at(dec!(1.10000), Side::Buy)];
        assert!(!may_open_new_cycle(&config, &cycles, None, dec!(2.00000), Side::Buy, dec!(0.0001)));
    }
}
