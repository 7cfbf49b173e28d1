//! TokenPlan Tokenomics Engine
//!
//! The canonical allocation and vesting computation behind every TokenPlan
//! surface:
//! - Allocation validation (category percentages must sum to 100% of supply)
//! - Per-category unlock schedules (genesis unlock, cliff, linear release)
//! - Project-wide aggregation for tables and time-series rendering
//!
//! The engine is pure and synchronous: no I/O, no shared state, identical
//! inputs always yield identical outputs.

pub mod allocation;
pub mod error;
pub mod project;
pub mod vesting;

pub use allocation::{AllocationCheck, AllocationEntry, AllocationSet, AllocationValidator};
pub use error::{Result, TokenomicsError};
pub use project::{CategorySummary, ProjectRow, ProjectSchedule, ProjectSummary, TokenProject};
pub use vesting::{ScheduleEngine, UnlockPoint, VestingPolicy};

/// Engine constants
pub mod constants {
    /// Maximum distance from 100% an allocation set may sum to and still
    /// validate
    pub const ALLOCATION_TOLERANCE: f64 = 0.01;
}
