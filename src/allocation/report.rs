//! Allocation change reporting

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use uuid::Uuid;

use super::allocator::{fraction_of, union_keys, Allocations};
use super::types::AllocationMethod;

/// Change in one strategy's allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationChange {
    pub strategy_id: String,
    pub old_fraction: Decimal,
    pub new_fraction: Decimal,
    /// new - old
    pub change: Decimal,
    /// change / old, zero when there was no previous allocation
    pub relative_change: Decimal,
}

/// Audit record of one allocation cycle
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub method: AllocationMethod,
    pub changes: Vec<AllocationChange>,
    /// Sum of absolute changes
    pub total_change: Decimal,
    /// Whether the new allocation was applied
    pub rebalanced: bool,
}

/// Build a report comparing `old` and `new`
pub fn generate_allocation_report(
    method: AllocationMethod,
    old: &Allocations,
    new: &Allocations,
    rebalanced: bool,
) -> AllocationReport {
    let changes: Vec<AllocationChange> = union_keys(old, new)
        .into_iter()
        .map(|strategy_id| {
            let old_fraction = fraction_of(old, strategy_id);
            let new_fraction = fraction_of(new, strategy_id);
            let change = new_fraction - old_fraction;
            let relative_change = if old_fraction > Decimal::ZERO {
                change / old_fraction
            } else {
                Decimal::ZERO
            };
            AllocationChange {
                strategy_id: strategy_id.to_string(),
                old_fraction,
                new_fraction,
                change,
                relative_change,
            }
        })
        .collect();
    let total_change = changes.iter().map(|c| c.change.abs()).sum();

    AllocationReport {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        method,
        changes,
        total_change,
        rebalanced,
    }
}

impl AllocationReport {
    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let mut output = format!(
            r#"
═══════════════════════════════════════════════════════════════
               ALLOCATION REBALANCE REPORT
═══════════════════════════════════════════════════════════════
Timestamp:       {}
Method:          {}
Rebalanced:      {}
Total Change:    {:.2}%
───────────────────────────────────────────────────────────────
{:<20} {:>10} {:>10} {:>10} {:>8}
───────────────────────────────────────────────────────────────
"#,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.method,
            self.rebalanced,
            self.total_change * dec!(100),
            "Strategy",
            "Old",
            "New",
            "Change",
            "Change%",
        );

        for change in &self.changes {
            output.push_str(&format!(
                "{:<20} {:>9.1}% {:>9.1}% {:>+9.1}% {:>+7.1}%\n",
                change.strategy_id,
                change.old_fraction * dec!(100),
                change.new_fraction * dec!(100),
                change.change * dec!(100),
                change.relative_change * dec!(100),
            ));
        }
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }
}
