use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::Booking;
use crate::config::HotelConfig;
use crate::decimal::Money;
use crate::errors::{HotelError, Result};
use crate::events::{Event, EventStore};
use crate::hotel::Hotel;
use crate::payments::{AllocationResult, PaymentLedger};
use crate::store::{
    InMemoryInvoiceStore, InMemoryPaymentStore, InMemoryRoomStore, InvoiceStore, PaymentStore,
    RoomStore,
};
use crate::types::{GuestName, InvoiceId, RoomNumber};

/// settled bill for one guest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub guest: GuestName,
    pub departure: NaiveDate,
    pub bookings_for_rooms: BTreeMap<RoomNumber, Vec<Booking>>,
    pub total_amount: Money,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    pub fn booking_count(&self) -> usize {
        self.bookings_for_rooms.values().map(Vec::len).sum()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomNumber> {
        self.bookings_for_rooms.keys()
    }
}

/// produces invoices and settles them against the guest's payments
pub struct SettlementEngine<
    R: RoomStore = InMemoryRoomStore,
    P: PaymentStore = InMemoryPaymentStore,
    I: InvoiceStore = InMemoryInvoiceStore,
> {
    config: Arc<HotelConfig>,
    rooms: Arc<R>,
    ledger: Arc<PaymentLedger<P>>,
    invoices: Arc<I>,
    /// one entry per guest with a settlement in flight
    guest_locks: DashMap<GuestName, Arc<Mutex<()>>>,
    events: Mutex<EventStore>,
}

impl<R: RoomStore, P: PaymentStore, I: InvoiceStore> SettlementEngine<R, P, I> {
    pub fn new(
        config: HotelConfig,
        rooms: Arc<R>,
        ledger: Arc<PaymentLedger<P>>,
        invoices: Arc<I>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(Arc::new(config), rooms, ledger, invoices))
    }

    /// engine billing the hotel's rooms at the rate the hotel quotes
    pub fn for_hotel(hotel: &Hotel<R>, ledger: Arc<PaymentLedger<P>>, invoices: Arc<I>) -> Self {
        Self::assemble(hotel.shared_config(), hotel.room_store(), ledger, invoices)
    }

    fn assemble(
        config: Arc<HotelConfig>,
        rooms: Arc<R>,
        ledger: Arc<PaymentLedger<P>>,
        invoices: Arc<I>,
    ) -> Self {
        Self {
            config,
            rooms,
            ledger,
            invoices,
            guest_locks: DashMap::new(),
            events: Mutex::new(EventStore::new()),
        }
    }

    pub fn config(&self) -> &HotelConfig {
        &self.config
    }

    pub fn ledger(&self) -> &PaymentLedger<P> {
        &self.ledger
    }

    /// produce an invoice with system time
    pub fn produce_invoice_now(
        &self,
        guest: &GuestName,
        departure: NaiveDate,
        room_numbers: &[RoomNumber],
    ) -> Result<Invoice> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.produce_invoice(guest, departure, room_numbers, &time)
    }

    /// invoice every eligible booking of `guest` in the given rooms and pay
    /// for it from the guest's credit, oldest payment first.
    ///
    /// Runs under a per-guest lock. All checks happen before anything is
    /// mutated; a second call with the same arguments finds nothing left to
    /// invoice.
    pub fn produce_invoice(
        &self,
        guest: &GuestName,
        departure: NaiveDate,
        room_numbers: &[RoomNumber],
        time_provider: &SafeTimeProvider,
    ) -> Result<Invoice> {
        if room_numbers.is_empty() {
            return Err(HotelError::NoRoomsRequested);
        }

        let lock = self.guest_lock(guest);
        let outcome = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.settle(guest, departure, room_numbers, time_provider)
        };
        drop(lock);
        self.release_guest_lock(guest);
        outcome
    }

    fn settle(
        &self,
        guest: &GuestName,
        departure: NaiveDate,
        room_numbers: &[RoomNumber],
        time_provider: &SafeTimeProvider,
    ) -> Result<Invoice> {
        let mut bookings_for_rooms = self.select_eligible(guest, departure, room_numbers)?;

        let total_amount = bookings_for_rooms
            .values()
            .flatten()
            .try_fold(Money::ZERO, |total, b| {
                total.checked_add(b.price(self.config.nightly_rate)?)
            })
            .ok_or_else(|| HotelError::AmountOverflow {
                operation: format!("invoice total of guest '{guest}'"),
            })?;

        let allocation = self.ledger.apply_credit(guest, total_amount).map_err(|e| {
            warn!(guest = %guest, %total_amount, error = %e, "settlement rejected");
            e
        })?;

        self.rooms.mark_invoiced(&bookings_for_rooms);
        bookings_for_rooms
            .values_mut()
            .flatten()
            .for_each(Booking::mark_invoiced);

        let now = time_provider.now();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            guest: guest.clone(),
            departure,
            bookings_for_rooms,
            total_amount,
            issued_at: now,
        };
        self.invoices.save(invoice.clone());
        self.record(&invoice, &allocation);

        Ok(invoice)
    }

    pub fn invoice(&self, id: &InvoiceId) -> Result<Invoice> {
        self.invoices
            .get(id)
            .ok_or(HotelError::InvoiceNotFound { id: *id })
    }

    pub fn invoices_for(&self, guest: &GuestName) -> Vec<Invoice> {
        self.invoices.load_for(guest)
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_events()
    }

    /// eligible bookings per requested room; fails naming every room with none
    fn select_eligible(
        &self,
        guest: &GuestName,
        departure: NaiveDate,
        room_numbers: &[RoomNumber],
    ) -> Result<BTreeMap<RoomNumber, Vec<Booking>>> {
        let mut selected = BTreeMap::new();
        let mut without_bookings = Vec::new();

        for number in room_numbers {
            if selected.contains_key(number) || without_bookings.contains(number) {
                continue;
            }
            let eligible: Vec<Booking> = self
                .rooms
                .room(number)
                .map(|room| {
                    room.bookings
                        .into_iter()
                        .filter(|b| b.is_invoiceable(guest, departure))
                        .collect()
                })
                .unwrap_or_default();

            if eligible.is_empty() {
                without_bookings.push(number.clone());
            } else {
                selected.insert(number.clone(), eligible);
            }
        }

        if !without_bookings.is_empty() {
            warn!(
                guest = %guest,
                %departure,
                rooms = ?without_bookings,
                "nothing to invoice"
            );
            return Err(HotelError::NothingToInvoice {
                guest: guest.clone(),
                departure,
                rooms: without_bookings,
            });
        }

        Ok(selected)
    }

    fn guest_lock(&self, guest: &GuestName) -> Arc<Mutex<()>> {
        self.guest_locks
            .entry(guest.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// drop the guest's lock once no other settlement holds or waits on it
    fn release_guest_lock(&self, guest: &GuestName) {
        self.guest_locks
            .remove_if(guest, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn record(&self, invoice: &Invoice, allocation: &AllocationResult) {
        info!(
            invoice_id = %invoice.id,
            guest = %invoice.guest,
            total = %invoice.total_amount,
            bookings = invoice.booking_count(),
            payments_touched = allocation.allocations.len(),
            "invoice issued"
        );

        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        for (room, bookings) in &invoice.bookings_for_rooms {
            for booking in bookings {
                events.emit(Event::BookingInvoiced {
                    room: room.clone(),
                    booking_id: booking.id,
                    invoice_id: invoice.id,
                });
            }
        }
        events.emit(Event::InvoiceIssued {
            invoice_id: invoice.id,
            guest: invoice.guest.clone(),
            total_amount: invoice.total_amount,
            timestamp: invoice.issued_at,
        });
    }
}
