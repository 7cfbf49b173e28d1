//! Vesting policies and the unlock schedule engine

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenomicsError};

/// Release rule for one allocation category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingPolicy {
    /// Percent of the category unlocked immediately at month 0
    pub tge_percent: f64,

    /// Months after genesis with no additional linear release.
    /// The genesis unlock itself is unaffected by the cliff.
    pub cliff_months: u32,

    /// Months over which the post-cliff remainder unlocks linearly,
    /// one equal increment per month
    pub vesting_months: u32,
}

impl VestingPolicy {
    pub fn new(tge_percent: f64, cliff_months: u32, vesting_months: u32) -> Self {
        Self {
            tge_percent,
            cliff_months,
            vesting_months,
        }
    }

    /// Everything unlocked at genesis
    pub fn immediate() -> Self {
        Self::new(100.0, 0, 0)
    }

    /// Linear release from month 0, no genesis unlock
    pub fn linear(vesting_months: u32) -> Self {
        Self::new(0.0, 0, vesting_months)
    }

    /// Cliff delay, then linear release of the full amount
    pub fn linear_with_cliff(cliff_months: u32, vesting_months: u32) -> Self {
        Self::new(0.0, cliff_months, vesting_months)
    }

    /// Checked conversion from raw (config-file) values.
    ///
    /// Negative month counts and non-finite or negative percentages are
    /// malformed input, reported with the offending category and field.
    pub fn from_parts(
        category: &str,
        tge_percent: f64,
        cliff_months: i64,
        vesting_months: i64,
    ) -> Result<Self> {
        if !tge_percent.is_finite() || tge_percent < 0.0 {
            return Err(TokenomicsError::InvalidPolicy {
                category: category.to_string(),
                field: "tge_percent",
                reason: format!("must be a finite non-negative number, got {}", tge_percent),
            });
        }
        let cliff = u32::try_from(cliff_months).map_err(|_| TokenomicsError::InvalidPolicy {
            category: category.to_string(),
            field: "cliff_months",
            reason: format!("must be a non-negative integer, got {}", cliff_months),
        })?;
        let vesting = u32::try_from(vesting_months).map_err(|_| TokenomicsError::InvalidPolicy {
            category: category.to_string(),
            field: "vesting_months",
            reason: format!("must be a non-negative integer, got {}", vesting_months),
        })?;
        Ok(Self::new(tge_percent, cliff, vesting))
    }

    /// First month at which the linear mechanism has fully run
    pub fn full_vesting_month(&self) -> u32 {
        self.cliff_months + self.vesting_months
    }

    pub(crate) fn ensure_well_formed(&self, category: &str) -> Result<()> {
        if !self.tge_percent.is_finite() || self.tge_percent < 0.0 {
            return Err(TokenomicsError::InvalidPolicy {
                category: category.to_string(),
                field: "tge_percent",
                reason: format!(
                    "must be a finite non-negative number, got {}",
                    self.tge_percent
                ),
            });
        }
        Ok(())
    }
}

/// One month's unlock sample for a single category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnlockPoint {
    pub month: u32,

    /// Amount released exactly at this month
    pub unlocked_this_month: f64,

    /// Running total through this month, rounded to two decimals
    pub cumulative_unlocked: f64,

    /// Cumulative share of the category total, in percent
    pub cumulative_percent: f64,
}

/// Two-decimal rounding applied at the engine boundary only
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Canonical vesting schedule computation.
///
/// Pure and stateless: identical inputs yield identical outputs, and every
/// consumer goes through this engine rather than re-deriving the math.
pub struct ScheduleEngine;

impl ScheduleEngine {
    /// Compute one category's unlock series.
    ///
    /// Month 0 always carries the genesis unlock, even when it is zero.
    /// Linear release of the remainder begins at `cliff_months` inclusive
    /// and runs for `vesting_months` equal increments; with a zero cliff the
    /// first increment stacks with the genesis unlock in month 0. The
    /// default horizon ends at `cliff_months + vesting_months`; a larger
    /// horizon extends the series with zero-unlock tail points.
    pub fn category_schedule(
        category: &str,
        total_amount: f64,
        policy: &VestingPolicy,
        horizon_months: Option<u32>,
    ) -> Result<Vec<UnlockPoint>> {
        policy.ensure_well_formed(category)?;

        let tge_amount = total_amount * policy.tge_percent / 100.0;
        let remainder = total_amount - tge_amount;
        let monthly = if policy.vesting_months > 0 {
            remainder / policy.vesting_months as f64
        } else {
            // The remainder never unlocks via the linear mechanism
            0.0
        };

        let full_month = policy.full_vesting_month();
        let horizon = horizon_months.unwrap_or(full_month);

        let mut points = Vec::with_capacity(horizon as usize + 1);
        let mut cumulative = 0.0_f64;

        for month in 0..=horizon {
            let mut unlocked = 0.0;
            if month == 0 {
                unlocked += tge_amount;
            }
            if policy.vesting_months > 0 && month >= policy.cliff_months && month < full_month {
                unlocked += monthly;
            }
            cumulative += unlocked;

            // Once the linear mechanism has run to completion the series
            // reports exactly the category total, not the float accumulation.
            let vested = if policy.vesting_months > 0 && month >= full_month {
                total_amount
            } else {
                cumulative
            };
            let percent = if total_amount == 0.0 {
                0.0
            } else {
                vested / total_amount * 100.0
            };

            points.push(UnlockPoint {
                month,
                unlocked_this_month: unlocked,
                cumulative_unlocked: round2(vested),
                cumulative_percent: round2(percent),
            });
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tge_cliff_linear() {
        // 1M tokens, 10% at genesis, 6 month cliff, 12 month linear release
        let policy = VestingPolicy::new(10.0, 6, 12);
        let points =
            ScheduleEngine::category_schedule("team", 1_000_000.0, &policy, None).unwrap();

        assert_eq!(points.len(), 19); // months 0..=18

        assert_eq!(points[0].unlocked_this_month, 100_000.0);
        assert_eq!(points[0].cumulative_unlocked, 100_000.0);
        assert_eq!(points[0].cumulative_percent, 10.0);

        for point in &points[1..6] {
            assert_eq!(point.unlocked_this_month, 0.0);
            assert_eq!(point.cumulative_unlocked, 100_000.0);
        }

        // Linear release starts at the cliff boundary itself
        for (i, point) in points[6..18].iter().enumerate() {
            assert_eq!(point.unlocked_this_month, 75_000.0);
            assert_eq!(
                point.cumulative_unlocked,
                100_000.0 + 75_000.0 * (i as f64 + 1.0)
            );
        }

        assert_eq!(points[17].cumulative_unlocked, 1_000_000.0);
        assert_eq!(points[17].cumulative_percent, 100.0);
        assert_eq!(points[18].unlocked_this_month, 0.0);
        assert_eq!(points[18].cumulative_unlocked, 1_000_000.0);
    }

    #[test]
    fn test_fully_unlocked_at_genesis() {
        let policy = VestingPolicy::immediate();
        let points =
            ScheduleEngine::category_schedule("liquidity", 1_000_000.0, &policy, None).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month, 0);
        assert_eq!(points[0].unlocked_this_month, 1_000_000.0);
        assert_eq!(points[0].cumulative_percent, 100.0);
    }

    #[test]
    fn test_zero_cliff_stacks_with_genesis_unlock() {
        // First linear increment lands in month 0, on top of the TGE amount
        let policy = VestingPolicy::new(10.0, 0, 12);
        let points = ScheduleEngine::category_schedule("team", 1_000.0, &policy, None).unwrap();

        assert_eq!(points[0].unlocked_this_month, 100.0 + 75.0);
        assert_eq!(points[1].unlocked_this_month, 75.0);
        assert_eq!(points.last().unwrap().cumulative_unlocked, 1_000.0);
    }

    #[test]
    fn test_no_linear_release_keeps_remainder_locked() {
        // vesting_months = 0 with a partial genesis unlock is valid: the
        // remainder simply never unlocks
        let policy = VestingPolicy::new(40.0, 3, 0);
        let points = ScheduleEngine::category_schedule("team", 1_000.0, &policy, None).unwrap();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].cumulative_unlocked, 400.0);
        assert_eq!(points[3].cumulative_unlocked, 400.0);
        assert_eq!(points[3].cumulative_percent, 40.0);
    }

    #[test]
    fn test_zero_amount_yields_zero_points() {
        let policy = VestingPolicy::new(10.0, 2, 6);
        let points = ScheduleEngine::category_schedule("team", 0.0, &policy, None).unwrap();

        assert_eq!(points.len(), 9);
        for point in &points {
            assert_eq!(point.unlocked_this_month, 0.0);
            assert_eq!(point.cumulative_unlocked, 0.0);
            assert_eq!(point.cumulative_percent, 0.0);
        }
    }

    #[test]
    fn test_horizon_extends_past_full_vesting() {
        let policy = VestingPolicy::new(10.0, 6, 12);
        let points =
            ScheduleEngine::category_schedule("team", 1_000_000.0, &policy, Some(24)).unwrap();

        assert_eq!(points.len(), 25);
        for point in &points[18..] {
            assert_eq!(point.unlocked_this_month, 0.0);
            assert_eq!(point.cumulative_unlocked, 1_000_000.0);
            assert_eq!(point.cumulative_percent, 100.0);
        }
    }

    #[test]
    fn test_cumulative_rounded_at_boundary() {
        // 1000 over 3 months: accumulation is unrounded, emission is not
        let policy = VestingPolicy::linear(3);
        let points = ScheduleEngine::category_schedule("team", 1_000.0, &policy, None).unwrap();

        assert_eq!(points[0].cumulative_unlocked, 333.33);
        assert_eq!(points[1].cumulative_unlocked, 666.67);
        assert_eq!(points[2].cumulative_unlocked, 1_000.0);
        assert_eq!(points[3].cumulative_unlocked, 1_000.0);
    }

    #[test]
    fn test_cumulative_non_decreasing() {
        let policy = VestingPolicy::new(15.0, 4, 9);
        let points = ScheduleEngine::category_schedule("team", 777_777.0, &policy, None).unwrap();

        for pair in points.windows(2) {
            assert!(pair[1].cumulative_unlocked >= pair[0].cumulative_unlocked);
        }
    }

    #[test]
    fn test_deterministic_output() {
        let policy = VestingPolicy::new(12.5, 3, 18);
        let a = ScheduleEngine::category_schedule("team", 123_456.78, &policy, None).unwrap();
        let b = ScheduleEngine::category_schedule("team", 123_456.78, &policy, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_over_allocated_policy_not_clamped() {
        // Policy sanity is the caller's concern; the arithmetic is faithful
        let policy = VestingPolicy::new(150.0, 0, 0);
        let points = ScheduleEngine::category_schedule("team", 1_000.0, &policy, None).unwrap();

        assert_eq!(points[0].unlocked_this_month, 1_500.0);
        assert_eq!(points[0].cumulative_percent, 150.0);
    }

    #[test]
    fn test_from_parts_rejects_negative_months() {
        let err = VestingPolicy::from_parts("team", 10.0, -1, 12).unwrap_err();
        assert!(matches!(
            err,
            TokenomicsError::InvalidPolicy { category, field, .. }
                if category == "team" && field == "cliff_months"
        ));
    }

    #[test]
    fn test_from_parts_rejects_non_finite_tge() {
        let err = VestingPolicy::from_parts("team", f64::NAN, 0, 12).unwrap_err();
        assert!(matches!(
            err,
            TokenomicsError::InvalidPolicy { field, .. } if field == "tge_percent"
        ));
    }

    #[test]
    fn test_malformed_policy_rejected_by_engine() {
        let policy = VestingPolicy::new(f64::INFINITY, 0, 12);
        let err = ScheduleEngine::category_schedule("team", 1_000.0, &policy, None).unwrap_err();
        assert!(matches!(err, TokenomicsError::InvalidPolicy { .. }));
    }
}
