//! Points accrual math
//!
//! Every deposited asset unit accrues points at a rate equal to its amount
//! expressed in the canonical 18-decimal unit, per hour.
//!
//! ## Units
//! - asset amounts: native asset precision (U256)
//! - rate and points: wad (U256), 18 decimals
//! - time: whole seconds
//!
//! Nothing here touches the contract env, so the ledger can call it with
//! whatever `now` and cutoff it derived for the current call.

use odra::prelude::*;
use odra::casper_types::U256;

/// Decimals of the canonical points unit
pub const POINTS_DECIMALS: u8 = 18;
/// Rate is expressed per hour
pub const SECONDS_PER_RATE_UNIT: u64 = 3_600;

/// Per-user accrual record.
///
/// Balances live beside it in the ledger storage, keyed by (user, asset).
#[odra::odra_type]
#[derive(Default)]
pub struct UserAccount {
    /// Points per hour, sum of the normalized balances of every asset
    pub accrual_rate: U256,
    /// Points already credited as of `last_settled`
    pub settled_points: U256,
    /// `None` until the account is touched for the first time
    pub last_settled: Option<u64>,
}

/// 10^exp, or None when it does not fit in U256.
fn pow10(exp: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

/// Convert a native asset amount into the 18-decimal points rate unit.
///
/// Assets with more than 18 decimals lose the sub-wad remainder (floor).
/// Returns None only when scaling up overflows.
pub fn normalize(amount: U256, asset_decimals: u8) -> Option<U256> {
    if asset_decimals == POINTS_DECIMALS {
        Some(amount)
    } else if asset_decimals < POINTS_DECIMALS {
        amount.checked_mul(pow10(POINTS_DECIMALS - asset_decimals)?)
    } else {
        match pow10(asset_decimals - POINTS_DECIMALS) {
            Some(divisor) => Some(amount / divisor),
            // divisor beyond U256::MAX, every amount floors to zero
            None => Some(U256::zero()),
        }
    }
}

/// Points earned by `rate` over `elapsed` seconds.
pub fn accrued(elapsed: u64, rate: U256) -> Option<U256> {
    rate.checked_mul(U256::from(elapsed))
        .map(|x| x / U256::from(SECONDS_PER_RATE_UNIT))
}

impl UserAccount {
    /// Seconds of accrual between the last settlement and `now`,
    /// never counting time past `cutoff`.
    fn elapsed(&self, now: u64, cutoff: Option<u64>) -> u64 {
        let last = match self.last_settled {
            Some(ts) => ts,
            None => return 0,
        };
        let effective_now = match cutoff {
            Some(cutoff) if now > cutoff => cutoff,
            _ => now,
        };
        // last may already be past the cutoff
        effective_now.saturating_sub(last)
    }

    /// Points accrued since the last settlement, not yet credited.
    pub fn pending(&self, now: u64, cutoff: Option<u64>) -> Option<U256> {
        accrued(self.elapsed(now, cutoff), self.accrual_rate)
    }

    /// Credit pending points and move `last_settled` to `now`.
    /// Returns the amount credited.
    pub fn settle(&mut self, now: u64, cutoff: Option<u64>) -> Option<U256> {
        let earned = self.pending(now, cutoff)?;
        self.settled_points = self.settled_points.checked_add(earned)?;
        self.last_settled = Some(now);
        Some(earned)
    }

    /// Settled plus pending points, without mutating the account.
    pub fn preview(&self, now: u64, cutoff: Option<u64>) -> Option<U256> {
        self.settled_points.checked_add(self.pending(now, cutoff)?)
    }

    /// Replace one asset's contribution to the rate.
    ///
    /// The rate only ever loses what `old_contribution` added to it, so a
    /// decrement cannot go below zero while the rate matches the balances.
    pub fn rebase_rate(&mut self, old_contribution: U256, new_contribution: U256) -> Option<U256> {
        self.accrual_rate = self
            .accrual_rate
            .checked_sub(old_contribution)?
            .checked_add(new_contribution)?;
        Some(self.accrual_rate)
    }

    /// Final exit: points are handed over, accrual stops for good.
    pub fn take_points(&mut self) -> U256 {
        let claimed = self.settled_points;
        self.settled_points = U256::zero();
        self.accrual_rate = U256::zero();
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAD: u128 = 1_000_000_000_000_000_000;

    fn wad(x: u128) -> U256 {
        U256::from(x) * U256::from(WAD)
    }

    #[test]
    fn test_normalize_same_precision() {
        assert_eq!(normalize(U256::from(12345u64), 18), Some(U256::from(12345u64)));
    }

    #[test]
    fn test_normalize_scales_up_low_precision() {
        // 0.5 units of a 6-decimal asset
        let half = U256::from(500_000u64);
        assert_eq!(normalize(half, 6), Some(U256::from(WAD / 2)));
        assert_eq!(normalize(U256::one(), 0), Some(U256::from(WAD)));
    }

    #[test]
    fn test_normalize_floors_high_precision() {
        // 24 decimals: the remainder below 1e6 is dropped
        assert_eq!(normalize(U256::from(1_999_999u64), 24), Some(U256::one()));
        assert_eq!(normalize(U256::from(999_999u64), 24), Some(U256::zero()));
    }

    #[test]
    fn test_normalize_huge_decimals_floors_to_zero() {
        assert_eq!(normalize(U256::MAX, 255), Some(U256::zero()));
    }

    #[test]
    fn test_normalize_overflow() {
        assert_eq!(normalize(U256::MAX, 0), None);
    }

    #[test]
    fn test_first_settle_only_starts_clock() {
        let mut account = UserAccount::default();
        account.accrual_rate = wad(1);
        assert_eq!(account.settle(1_000, None), Some(U256::zero()));
        assert_eq!(account.last_settled, Some(1_000));
        assert_eq!(account.settled_points, U256::zero());
    }

    #[test]
    fn test_settle_one_hour_one_point() {
        let mut account = UserAccount {
            accrual_rate: wad(1),
            settled_points: U256::zero(),
            last_settled: Some(0),
        };
        account.settle(3_600, None);
        assert_eq!(account.settled_points, wad(1));
        account.settle(7_200, None);
        assert_eq!(account.settled_points, wad(2));
    }

    #[test]
    fn test_settle_floors_partial_hour() {
        let mut account = UserAccount {
            accrual_rate: wad(1),
            settled_points: U256::zero(),
            last_settled: Some(0),
        };
        account.settle(3_599, None);
        let expected = U256::from(3_599u64) * U256::from(WAD) / U256::from(3_600u64);
        assert_eq!(account.settled_points, expected);
    }

    #[test]
    fn test_settle_clamps_at_cutoff() {
        let mut account = UserAccount {
            accrual_rate: wad(2),
            settled_points: U256::zero(),
            last_settled: Some(0),
        };
        account.settle(10_000, Some(3_600));
        assert_eq!(account.settled_points, wad(2));
        // clock still advances to now
        assert_eq!(account.last_settled, Some(10_000));

        // later settlement past the cutoff adds nothing and does not underflow
        assert_eq!(account.settle(20_000, Some(3_600)), Some(U256::zero()));
        assert_eq!(account.settled_points, wad(2));
    }

    #[test]
    fn test_cutoff_in_future_does_not_clamp() {
        let account = UserAccount {
            accrual_rate: wad(1),
            settled_points: U256::zero(),
            last_settled: Some(0),
        };
        assert_eq!(account.preview(3_600, Some(100_000)), Some(wad(1)));
    }

    #[test]
    fn test_preview_matches_settle_and_does_not_mutate() {
        let mut account = UserAccount {
            accrual_rate: wad(3),
            settled_points: wad(1),
            last_settled: Some(100),
        };
        let before = account.clone();
        let first = account.preview(7_300, None);
        let second = account.preview(7_300, None);
        assert_eq!(first, second);
        assert_eq!(account, before);

        account.settle(7_300, None);
        assert_eq!(Some(account.settled_points), first);
    }

    #[test]
    fn test_rebase_rate_replaces_contribution() {
        let mut account = UserAccount::default();
        account.rebase_rate(U256::zero(), wad(5));
        account.rebase_rate(wad(5), wad(2));
        assert_eq!(account.accrual_rate, wad(2));
        assert_eq!(account.rebase_rate(wad(3), U256::zero()), None);
    }

    #[test]
    fn test_take_points_resets_accrual() {
        let mut account = UserAccount {
            accrual_rate: wad(1),
            settled_points: wad(7),
            last_settled: Some(0),
        };
        assert_eq!(account.take_points(), wad(7));
        assert_eq!(account.preview(1_000_000, None), Some(U256::zero()));
    }
}
