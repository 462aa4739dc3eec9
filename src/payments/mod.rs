pub mod allocation;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{HotelError, Result};
use crate::events::{Event, EventStore};
use crate::store::{InMemoryPaymentStore, PaymentStore};
use crate::types::{GuestName, PaymentId};

pub use allocation::{allocate_oldest_first, AllocationResult, PaymentAllocation};

/// money handed over by a guest, consumed by later invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub guest: GuestName,
    pub paid_amount: Money,
    pub used_amount: Money,
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    pub fn new(guest: GuestName, paid_amount: Money, payment_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            guest,
            paid_amount,
            used_amount: Money::ZERO,
            payment_date,
        }
    }

    /// unconsumed part of this payment
    pub fn remaining(&self) -> Money {
        self.paid_amount.saturating_sub(self.used_amount)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// used amount only grows and never passes the paid amount
    pub(crate) fn consume(&mut self, amount: Money) {
        let applied = amount.min(self.remaining()).max(Money::ZERO);
        self.used_amount += applied;
    }
}

/// per-guest payment ledger
pub struct PaymentLedger<P: PaymentStore = InMemoryPaymentStore> {
    store: Arc<P>,
    events: Mutex<EventStore>,
}

impl PaymentLedger<InMemoryPaymentStore> {
    /// ledger over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPaymentStore::new()))
    }
}

impl<P: PaymentStore> PaymentLedger<P> {
    pub fn new(store: Arc<P>) -> Self {
        Self {
            store,
            events: Mutex::new(EventStore::new()),
        }
    }

    /// record a payment with system time
    pub fn pay_now(&self, guest: &GuestName, amount: Money) -> Result<Payment> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.pay(guest, amount, &time)
    }

    /// record a payment dated by the given time provider
    pub fn pay(
        &self,
        guest: &GuestName,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        if !amount.is_positive() {
            warn!(guest = %guest, %amount, "rejected non-positive payment");
            return Err(HotelError::InvalidPaymentAmount { amount });
        }

        let now = time_provider.now();
        let payment = Payment::new(guest.clone(), amount, now);
        self.store
            .update(guest, |payments| -> Result<()> {
                // credit must stay representable for every later sum
                Money::checked_sum(payments.iter().map(Payment::remaining))
                    .and_then(|credit| credit.checked_add(amount))
                    .ok_or_else(|| HotelError::AmountOverflow {
                        operation: format!("credit of guest '{guest}'"),
                    })?;
                payments.push(payment.clone());
                Ok(())
            })
            .map_err(|e| {
                warn!(guest = %guest, %amount, "payment rejected: {e}");
                e
            })?;

        info!(guest = %guest, %amount, payment_id = %payment.id, "payment received");
        self.emit(Event::PaymentReceived {
            payment_id: payment.id,
            guest: guest.clone(),
            amount,
            timestamp: now,
        });

        Ok(payment)
    }

    /// sum of everything paid and not yet consumed
    pub fn remaining_credit(&self, guest: &GuestName) -> Money {
        self.store
            .load(guest)
            .iter()
            .map(Payment::remaining)
            .fold(Money::ZERO, Money::saturating_add)
    }

    /// payments in the order they were made
    pub fn payments(&self, guest: &GuestName) -> Vec<Payment> {
        self.store.load(guest)
    }

    /// consume `total` from the guest's credit, oldest payment first.
    ///
    /// Checks solvency and allocates inside one store update, so either the
    /// whole amount is consumed or the ledger is left as it was.
    pub fn apply_credit(&self, guest: &GuestName, total: Money) -> Result<AllocationResult> {
        let result = self.store.update(guest, |payments| -> Result<AllocationResult> {
            let available = Money::checked_sum(payments.iter().map(Payment::remaining))
                .ok_or_else(|| HotelError::AmountOverflow {
                    operation: format!("credit of guest '{guest}'"),
                })?;
            if total > available {
                return Err(HotelError::InsufficientFunds {
                    required: total,
                    available,
                    shortfall: total - available,
                });
            }
            Ok(allocate_oldest_first(payments, total))
        })?;

        debug!(
            guest = %guest,
            %total,
            payments_touched = result.allocations.len(),
            "credit applied"
        );
        for allocation in &result.allocations {
            self.emit(Event::PaymentApplied {
                payment_id: allocation.payment_id,
                guest: guest.clone(),
                amount: allocation.amount,
                remaining_on_payment: allocation.remaining_on_payment,
            });
        }

        Ok(result)
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_events()
    }

    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(event);
    }
}
