use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BookingId, GuestName, InvoiceId, PaymentId, RoomNumber};

/// all events emitted by the booking desk and the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // inventory events
    RoomAdded {
        room: RoomNumber,
    },

    // stay events
    RoomBooked {
        room: RoomNumber,
        booking_id: BookingId,
        guest: GuestName,
        arrival: NaiveDate,
        departure: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    GuestCheckedIn {
        room: RoomNumber,
        booking_id: BookingId,
        guest: GuestName,
        timestamp: DateTime<Utc>,
    },
    GuestCheckedOut {
        room: RoomNumber,
        booking_id: BookingId,
        guest: GuestName,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        payment_id: PaymentId,
        guest: GuestName,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentApplied {
        payment_id: PaymentId,
        guest: GuestName,
        amount: Money,
        remaining_on_payment: Money,
    },

    // settlement events
    BookingInvoiced {
        room: RoomNumber,
        booking_id: BookingId,
        invoice_id: InvoiceId,
    },
    InvoiceIssued {
        invoice_id: InvoiceId,
        guest: GuestName,
        total_amount: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
