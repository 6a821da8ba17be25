//! Dynamic allocation module
//!
//! Weighting methods, rebalance decisions, and allocation reports

mod allocator;
mod report;
mod types;

pub use allocator::{
    blend_allocations, calculate_allocations, rank_strategies, should_rebalance, Allocations,
    DynamicAllocator, KellyWeighting,
};
pub use report::{generate_allocation_report, AllocationChange, AllocationReport};
pub use types::{
    AllocationError, AllocationMethod, PerformanceProvider, PerformanceStats, RankMetric,
};
