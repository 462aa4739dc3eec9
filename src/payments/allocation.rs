use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::PaymentId;

use super::Payment;

/// portion of one payment consumed by a settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub payment_id: PaymentId,
    pub amount: Money,
    pub remaining_on_payment: Money,
}

/// outcome of walking the ledger against an amount owed.
///
/// The allocator does not check solvency itself: given too little credit it
/// consumes everything and reports the rest as `unallocated`. The ledger
/// checks solvency first, so its allocations are always complete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationResult {
    pub allocations: Vec<PaymentAllocation>,
    /// part of the amount owed that no payment could cover
    pub unallocated: Money,
}

impl AllocationResult {
    pub fn total_allocated(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.unallocated.is_zero()
    }
}

/// consume `total` from the payments, oldest payment date first.
///
/// Payments keep their stored order; only the walk is sorted. Ties on the
/// payment date keep insertion order. Never marks more than `total` as used.
pub fn allocate_oldest_first(payments: &mut [Payment], total: Money) -> AllocationResult {
    let mut order: Vec<usize> = (0..payments.len()).collect();
    order.sort_by_key(|&i| payments[i].payment_date);

    let mut remaining = total;
    let mut result = AllocationResult::default();

    for i in order {
        if !remaining.is_positive() {
            break;
        }
        let payment = &mut payments[i];
        let available = payment.remaining();
        if available.is_zero() {
            continue;
        }

        let applied = available.min(remaining);
        payment.consume(applied);
        remaining -= applied;

        result.allocations.push(PaymentAllocation {
            payment_id: payment.id,
            amount: applied,
            remaining_on_payment: payment.remaining(),
        });
    }

    result.unallocated = remaining.max(Money::ZERO);
    result
}
