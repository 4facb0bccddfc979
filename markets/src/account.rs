//! Identity of a broker login as seen by the remote store (§3, "Account").

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an [`Account`]. Created once on first successful
/// validation against the remote store; never destroyed while the
/// process runs (§3).
#[derive(gridloop_macros::SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    PendingValidation,
    Active,
    Disabled,
}

/// A balance/equity/margin/PnL snapshot, refreshed once per second by the
/// Account Supervisor's metrics publisher (§4.8 item 1) and rounded to two
/// decimal places before it is pushed to the remote store (§8 "Round-trip"
/// law).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: Decimal,
    pub equity: Decimal,
    pub margin: Decimal,
    pub free_margin: Decimal,
    pub profit: Decimal,
}

impl AccountSnapshot {
    /// Rounds every field to two decimal places, matching the remote
    /// store's accepted precision for these fields (§8).
    pub fn rounded(self) -> Self {
        Self {
            balance: self.balance.round_dp(2),
            equity: self.equity.round_dp(2),
            margin: self.margin.round_dp(2),
            free_margin: self.free_margin.round_dp(2),
            profit: self.profit.round_dp(2),
        }
    }
}

/// Identity of a broker login as seen by the remote store (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub remote_id: Option<String>,
    pub display_name: String,
    pub status: AccountStatus,
    /// The broker-side login identifier returned by `AccountInfo` (§4.1).
    pub login: String,
    pub snapshot: AccountSnapshot,
}

impl Account {
    pub fn new(id: impl Into<String>, login: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            remote_id: None,
            display_name: display_name.into(),
            status: AccountStatus::PendingValidation,
            login: login.into(),
            snapshot: AccountSnapshot::default(),
        }
    }

    /// Returns `true` iff applying `new` would change any published field,
    /// so the Account Supervisor only pushes to the remote store on an
    /// actual change (§4.8 item 1: "if any of {balance, equity, margin,
    /// PnL} changed").
    pub fn snapshot_changed(&self, new: &AccountSnapshot) -> bool {
        self.snapshot != new.rounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn snapshot_rounds_to_two_decimal_places() {
        let raw = AccountSnapshot {
            balance: dec!(1000.12345),
            equity: dec!(999.999),
            margin: dec!(0),
            free_margin: dec!(0),
            profit: dec!(-1.005),
        };
        let rounded = raw.rounded();
        assert_eq!(rounded.balance, dec!(1000.12));
        assert_eq!(rounded.equity, dec!(1000.00));
    }

    #[test]
    fn unchanged_snapshot_is_not_flagged_as_changed() {
        let mut account = Account::new("acct-1", "12345", "Demo");
        account.snapshot = AccountSnapshot {
            balance: dec!(100.00),
            ..Default::default()
        };
        let same = account.snapshot;
        assert!(!account.snapshot_changed(&same));
        let different = AccountSnapshot {
            balance: dec!(100.01),
            ..Default::default()
        };
        assert!(account.snapshot_changed(&different));
    }
}
