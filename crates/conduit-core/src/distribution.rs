//! The distribution loop shared by every resource kind.
//!
//! Callers pass an ordered target list and an `offer` callback. The loop
//! decides how much each target may take under the chosen mode; the
//! callback checks the target (existence, type compatibility, free space),
//! applies what it accepts and returns that amount. Nothing is taken from
//! the source here: callers consume the returned total in one step.

use crate::network::TransferMode;
use crate::pos::BlockPos;

/// Limits for one distribution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Maximum moved this pass.
    pub speed: u64,
    /// What the source currently holds.
    pub available: u64,
}

impl Budget {
    pub fn new(speed: u64, available: u64) -> Self {
        Self {
            speed: speed.min(available),
            available,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.speed == 0 || self.available == 0
    }

    fn spend(&mut self, amount: u64) {
        self.speed = self.speed.saturating_sub(amount);
        self.available = self.available.saturating_sub(amount);
    }

    fn limit(&self) -> u64 {
        self.speed.min(self.available)
    }
}

/// Offer quantity to `targets` in order. `offer(target, limit)` returns
/// how much the target accepted, never more than `limit`.
///
/// Sequential modes give each target up to the remaining budget. Round
/// mode gives each target at most `speed / targets.len()`, rounded down;
/// a share refused by one target is not handed to the others.
pub fn distribute<F>(targets: &[BlockPos], mode: TransferMode, budget: Budget, mut offer: F) -> u64
where
    F: FnMut(BlockPos, u64) -> u64,
{
    let mut budget = budget;
    if budget.is_exhausted() || targets.is_empty() {
        return 0;
    }

    let share = match mode {
        TransferMode::Round => {
            let share = budget.speed / targets.len() as u64;
            if share == 0 {
                return 0;
            }
            Some(share)
        }
        TransferMode::Nearest | TransferMode::Farthest => None,
    };

    let mut total = 0;
    for &target in targets {
        if budget.is_exhausted() {
            break;
        }
        let limit = share.map_or(budget.limit(), |s| s.min(budget.limit()));
        let accepted = offer(target, limit).min(limit);
        if accepted > 0 {
            budget.spend(accepted);
            total += accepted;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: i32) -> Vec<BlockPos> {
        (1..=n).map(|x| BlockPos::new(x, 0, 0)).collect()
    }

    /// Targets with fixed free space; returns accepted amounts per target.
    fn run(space: &[u64], mode: TransferMode, speed: u64, available: u64) -> (u64, Vec<u64>) {
        let targets = line(space.len() as i32);
        let mut free = space.to_vec();
        let mut got = vec![0; space.len()];
        let total = distribute(&targets, mode, Budget::new(speed, available), |pos, limit| {
            let i = (pos.x - 1) as usize;
            let take = limit.min(free[i]);
            free[i] -= take;
            got[i] += take;
            take
        });
        (total, got)
    }

    #[test]
    fn nearest_fills_in_order() {
        let (total, got) = run(&[50, 100, 100], TransferMode::Nearest, 120, 1000);
        assert_eq!(total, 120);
        assert_eq!(got, vec![50, 70, 0]);
    }

    #[test]
    fn bounded_by_available() {
        let (total, got) = run(&[100, 100], TransferMode::Nearest, 500, 30);
        assert_eq!(total, 30);
        assert_eq!(got, vec![30, 0]);
    }

    #[test]
    fn round_splits_evenly() {
        let (total, got) = run(&[1000, 1000, 1000], TransferMode::Round, 300, 1000);
        assert_eq!(total, 300);
        assert_eq!(got, vec![100, 100, 100]);
    }

    #[test]
    fn round_does_not_redistribute_refused_share() {
        let (total, got) = run(&[0, 1000], TransferMode::Round, 200, 1000);
        assert_eq!(total, 100);
        assert_eq!(got, vec![0, 100]);
    }

    #[test]
    fn round_share_below_one_moves_nothing() {
        let (total, _) = run(&[10, 10, 10], TransferMode::Round, 2, 1000);
        assert_eq!(total, 0);
    }

    #[test]
    fn exhausted_budget_skips_offers() {
        let mut calls = 0;
        let total = distribute(&line(3), TransferMode::Nearest, Budget::new(0, 100), |_, _| {
            calls += 1;
            0
        });
        assert_eq!((total, calls), (0, 0));
    }

    #[test]
    fn over_reporting_offer_is_clamped() {
        let total = distribute(&line(1), TransferMode::Nearest, Budget::new(10, 100), |_, _| 99);
        assert_eq!(total, 10);
    }
}
