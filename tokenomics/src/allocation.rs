//! Allocation model and validation

use serde::{Deserialize, Serialize};

use crate::constants::ALLOCATION_TOLERANCE;
use crate::error::{Result, TokenomicsError};

/// One category's share of total supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub category: String,
    pub percentage: f64,
}

impl AllocationEntry {
    /// Token amount this entry carves out of the given total supply.
    /// Amounts are always derived from the percentage, never stored.
    pub fn amount(&self, total_supply: f64) -> f64 {
        self.percentage / 100.0 * total_supply
    }
}

/// Insertion-ordered set of allocation entries, unique by category.
///
/// Iteration order is insertion order, so reports render deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSet {
    entries: Vec<AllocationEntry>,
}

impl AllocationSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a category share. Duplicate categories are rejected.
    pub fn insert(&mut self, category: impl Into<String>, percentage: f64) -> Result<()> {
        let category = category.into();
        if self.entries.iter().any(|e| e.category == category) {
            return Err(TokenomicsError::InvalidAllocation(format!(
                "duplicate category '{}'",
                category
            )));
        }
        self.entries.push(AllocationEntry {
            category,
            percentage,
        });
        Ok(())
    }

    pub fn get(&self, category: &str) -> Option<&AllocationEntry> {
        self.entries.iter().find(|e| e.category == category)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_percentage(&self) -> f64 {
        self.entries.iter().map(|e| e.percentage).sum()
    }
}

/// Outcome of allocation validation.
///
/// Returned as a value rather than an error so forms can render the
/// feedback inline without exception handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocationCheck {
    /// Every percentage is in range and the set sums to 100% within tolerance
    Valid,
    /// An entry is negative, above 100, or not a finite number
    OutOfRange { category: String, percentage: f64 },
    /// Entries are individually fine but do not sum to 100%
    SumMismatch { total: f64 },
}

impl AllocationCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

pub struct AllocationValidator;

impl AllocationValidator {
    /// Check that every percentage is well-formed and the set sums to 100%.
    ///
    /// Out-of-range values are reported, not clamped.
    pub fn validate(set: &AllocationSet) -> AllocationCheck {
        for entry in set.iter() {
            if !entry.percentage.is_finite()
                || entry.percentage < 0.0
                || entry.percentage > 100.0
            {
                return AllocationCheck::OutOfRange {
                    category: entry.category.clone(),
                    percentage: entry.percentage,
                };
            }
        }

        let total = set.total_percentage();
        if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
            return AllocationCheck::SumMismatch { total };
        }

        AllocationCheck::Valid
    }
}
