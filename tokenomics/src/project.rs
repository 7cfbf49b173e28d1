//! Project-level aggregation and summaries

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationCheck, AllocationSet, AllocationValidator};
use crate::error::{Result, TokenomicsError};
use crate::vesting::{round2, ScheduleEngine, VestingPolicy};

/// A token project: total supply split into categories, each with an
/// optional release policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenProject {
    pub name: String,
    pub total_supply: f64,
    pub allocations: AllocationSet,

    /// Release policies keyed by category. Categories without a policy are
    /// fully unlocked at month 0; a policy whose category has no matching
    /// allocation entry is inert.
    pub policies: HashMap<String, VestingPolicy>,
}

impl TokenProject {
    pub fn new(name: impl Into<String>, total_supply: f64) -> Self {
        Self {
            name: name.into(),
            total_supply,
            allocations: AllocationSet::new(),
            policies: HashMap::new(),
        }
    }

    /// The policy governing a category, defaulting to full genesis unlock
    pub fn policy_for(&self, category: &str) -> VestingPolicy {
        self.policies
            .get(category)
            .cloned()
            .unwrap_or_else(VestingPolicy::immediate)
    }

    pub fn schedule(&self) -> Result<ProjectSchedule> {
        ScheduleEngine::project_schedule(self)
    }

    /// Per-category amounts and release overview for display
    pub fn summary(&self) -> ProjectSummary {
        let mut categories = Vec::with_capacity(self.allocations.len());
        let mut tge_unlock = 0.0;
        let mut full_vesting_month = 0;

        for entry in self.allocations.iter() {
            let policy = self.policy_for(&entry.category);
            let amount = entry.amount(self.total_supply);
            tge_unlock += amount * policy.tge_percent / 100.0;
            full_vesting_month = full_vesting_month.max(policy.full_vesting_month());
            categories.push(CategorySummary {
                category: entry.category.clone(),
                percentage: entry.percentage,
                amount,
                full_vesting_month: policy.full_vesting_month(),
                policy,
            });
        }

        let tge_percent_of_supply = if self.total_supply == 0.0 {
            0.0
        } else {
            tge_unlock / self.total_supply * 100.0
        };

        ProjectSummary {
            name: self.name.clone(),
            total_supply: self.total_supply,
            categories,
            tge_unlock: round2(tge_unlock),
            tge_percent_of_supply: round2(tge_percent_of_supply),
            full_vesting_month,
        }
    }
}

/// One month of the project-wide unlock table.
///
/// Column order follows the allocation set's insertion order. The
/// per-category cumulative stays pinned at the category's full amount once
/// it has vested; the incremental column reports zero from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub month: u32,
    pub unlocked_this_month: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub total_unlocked_this_month: f64,
    pub cumulative_total: f64,
}

/// Project-wide unlock table, one row per month with no gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSchedule {
    pub categories: Vec<String>,
    pub rows: Vec<ProjectRow>,
}

/// Per-category line in a project summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub percentage: f64,
    pub amount: f64,
    pub policy: VestingPolicy,
    pub full_vesting_month: u32,
}

/// Project overview: derived amounts, genesis unlock, time to full vesting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub total_supply: f64,
    pub categories: Vec<CategorySummary>,
    pub tge_unlock: f64,
    pub tge_percent_of_supply: f64,
    pub full_vesting_month: u32,
}

impl ScheduleEngine {
    /// Aggregate every category's schedule into one row per month.
    ///
    /// The horizon is the latest full-vesting month across categories with
    /// a matching allocation entry. An allocation set that fails validation
    /// aborts aggregation, so renderers cannot chart a split the authoring
    /// surface would reject.
    pub fn project_schedule(project: &TokenProject) -> Result<ProjectSchedule> {
        match AllocationValidator::validate(&project.allocations) {
            AllocationCheck::Valid => {}
            AllocationCheck::OutOfRange {
                category,
                percentage,
            } => {
                return Err(TokenomicsError::InvalidAllocation(format!(
                    "category '{}' has out-of-range percentage {}",
                    category, percentage
                )));
            }
            AllocationCheck::SumMismatch { total } => {
                return Err(TokenomicsError::InvalidAllocation(format!(
                    "percentages sum to {}%, expected 100%",
                    total
                )));
            }
        }

        let horizon = project
            .allocations
            .iter()
            .map(|entry| project.policy_for(&entry.category).full_vesting_month())
            .max()
            .unwrap_or(0);

        let mut categories = Vec::with_capacity(project.allocations.len());
        let mut schedules = Vec::with_capacity(project.allocations.len());
        for entry in project.allocations.iter() {
            let policy = project.policy_for(&entry.category);
            let series = Self::category_schedule(
                &entry.category,
                entry.amount(project.total_supply),
                &policy,
                Some(horizon),
            )?;
            categories.push(entry.category.clone());
            schedules.push(series);
        }

        let mut rows = Vec::with_capacity(horizon as usize + 1);
        let mut running_total = 0.0_f64;
        for month in 0..=horizon {
            let m = month as usize;
            let unlocked: Vec<f64> = schedules.iter().map(|s| s[m].unlocked_this_month).collect();
            let cumulative: Vec<f64> = schedules.iter().map(|s| s[m].cumulative_unlocked).collect();
            let total_unlocked: f64 = unlocked.iter().sum();
            running_total += total_unlocked;

            rows.push(ProjectRow {
                month,
                unlocked_this_month: unlocked,
                cumulative,
                total_unlocked_this_month: total_unlocked,
                cumulative_total: round2(running_total),
            });
        }

        Ok(ProjectSchedule { categories, rows })
    }
}
