//! Payment allocation across fee buckets
//!
//! A payment is spread over the buckets of a fee record in a fixed priority
//! order. Each bucket absorbs at most its outstanding due, so a bucket's `due`
//! can never go negative. Whatever is left after the last bucket in the order
//! is reported back as `unallocated`; it is never dropped silently.

use crate::config::AllocationOrder;
use crate::types::{Allocation, BucketRef, FeeBucket, FeeBuckets};
use rust_decimal::Decimal;

/// Result of spreading one payment over the buckets
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    /// Non-zero applications, in the order they were made
    pub allocations: Vec<Allocation>,
    /// Part of the payment no bucket in the order could absorb
    pub unallocated: Decimal,
}

/// Total due the given order can absorb
pub fn allocatable_due(fees: &FeeBuckets, order: AllocationOrder) -> Decimal {
    let fixed: Decimal = order.heads().iter().map(|head| fees.fixed(*head).due).sum();
    let other: Decimal = fees.other_fees.iter().map(|other| other.bucket.due).sum();
    fixed + other
}

/// Apply `amount` to the buckets in priority order
///
/// Only `paid` and `due` are touched; bucket status and record totals are the
/// status deriver's job.
pub fn allocate(fees: &mut FeeBuckets, amount: Decimal, order: AllocationOrder) -> AllocationOutcome {
    let mut remaining = amount;
    let mut allocations = Vec::new();

    for head in order.heads() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let applied = apply(fees.fixed_mut(*head), &mut remaining);
        if applied > Decimal::ZERO {
            allocations.push(Allocation {
                bucket: BucketRef::Fixed(*head),
                applied,
            });
        }
    }

    for other in fees.other_fees.iter_mut() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let applied = apply(&mut other.bucket, &mut remaining);
        if applied > Decimal::ZERO {
            allocations.push(Allocation {
                bucket: BucketRef::Other(other.name.clone()),
                applied,
            });
        }
    }

    AllocationOutcome {
        allocations,
        unallocated: remaining.max(Decimal::ZERO),
    }
}

fn apply(bucket: &mut FeeBucket, remaining: &mut Decimal) -> Decimal {
    let applied = (*remaining).min(bucket.due);
    if applied <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    bucket.paid += applied;
    bucket.due -= applied;
    *remaining -= applied;
    applied
}
