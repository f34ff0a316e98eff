//! Payment and receipt number generation
//!
//! Identifiers keep the college's printed format: `PAY` followed by the last
//! eight digits of the epoch-millisecond timestamp, `RCP` followed by the last
//! six. The generator never reuses a millisecond value: when two payments
//! arrive within the same millisecond (or out of order) the later one takes
//! the next free value, so identifiers issued by one generator are distinct
//! until the digit window wraps.

use crate::types::PaymentIds;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Thread-safe, monotonic payment identifier source
#[derive(Debug)]
pub struct ReceiptGenerator {
    last_millis: AtomicI64,
}

impl ReceiptGenerator {
    pub fn new() -> Self {
        Self {
            last_millis: AtomicI64::new(i64::MIN),
        }
    }

    /// Issue identifiers for a payment received at `at`
    pub fn next(&self, at: DateTime<Utc>) -> PaymentIds {
        let candidate = at.timestamp_millis();
        let bump = |last: i64| candidate.max(last.saturating_add(1));

        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        let millis = bump(previous);

        PaymentIds {
            payment_id: format!("PAY{:08}", millis.rem_euclid(100_000_000)),
            receipt_number: format!("RCP{:06}", millis.rem_euclid(1_000_000)),
        }
    }
}

impl Default for ReceiptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_use_trailing_timestamp_digits() {
        let generator = ReceiptGenerator::new();
        let at = Utc.timestamp_millis_opt(1_717_171_234_567_i64).unwrap();

        let ids = generator.next(at);

        assert_eq!(ids.payment_id, "PAY71234567");
        assert_eq!(ids.receipt_number, "RCP234567");
    }

    #[test]
    fn test_same_millisecond_gets_next_value() {
        let generator = ReceiptGenerator::new();
        let at = Utc.timestamp_millis_opt(1_717_171_234_567_i64).unwrap();

        let first = generator.next(at);
        let second = generator.next(at);

        assert_eq!(first.receipt_number, "RCP234567");
        assert_eq!(second.receipt_number, "RCP234568");
    }

    #[test]
    fn test_earlier_timestamp_does_not_go_backwards() {
        let generator = ReceiptGenerator::new();
        let later = Utc.timestamp_millis_opt(2_000).unwrap();
        let earlier = Utc.timestamp_millis_opt(1_000).unwrap();

        generator.next(later);
        let ids = generator.next(earlier);

        assert_eq!(ids.payment_id, "PAY00002001");
    }

    #[test]
    fn test_concurrent_callers_never_collide() {
        let generator = Arc::new(ReceiptGenerator::new());
        let at = Utc.timestamp_millis_opt(5_000).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| generator.next(at).payment_id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate payment id issued");
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
