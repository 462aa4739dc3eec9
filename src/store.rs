use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::booking::Booking;
use crate::errors::{HotelError, Result};
use crate::payments::Payment;
use crate::room::Room;
use crate::settlement::Invoice;
use crate::types::{BookingId, GuestName, InvoiceId, RoomNumber};

/// room directory: load/save of rooms plus guest lookups
pub trait RoomStore: Send + Sync {
    /// insert or replace a room, keeping the position of an existing one
    fn save(&self, room: Room);

    /// insert a room only if its number is unused; `false` leaves the
    /// existing room untouched
    fn insert_new(&self, room: Room) -> bool;

    fn room(&self, number: &RoomNumber) -> Option<Room>;

    /// every room, in the order rooms were first saved
    fn all_rooms(&self) -> Vec<Room>;

    /// mutate a room in place; `None` if it does not exist
    fn update<T>(&self, number: &RoomNumber, f: impl FnOnce(&mut Room) -> T) -> Option<T>;

    fn rooms_with_bookings_for(&self, guest: &GuestName) -> Vec<Room> {
        self.all_rooms()
            .into_iter()
            .filter(|room| room.has_bookings_for(guest))
            .collect()
    }

    fn bookings_for(&self, guest: &GuestName) -> Vec<Booking> {
        self.all_rooms()
            .iter()
            .flat_map(|room| room.bookings_for(guest).cloned().collect::<Vec<_>>())
            .collect()
    }

    /// flag exactly the listed bookings (matched by id) as invoiced
    fn mark_invoiced(&self, bookings_for_rooms: &BTreeMap<RoomNumber, Vec<Booking>>) {
        for (number, bookings) in bookings_for_rooms {
            let ids: Vec<BookingId> = bookings.iter().map(|b| b.id).collect();
            self.update(number, |room| {
                room.bookings
                    .iter_mut()
                    .filter(|b| ids.contains(&b.id))
                    .for_each(Booking::mark_invoiced);
            });
        }
    }
}

/// payment storage keyed by guest
pub trait PaymentStore: Send + Sync {
    /// the guest's payments in insertion order, empty if none
    fn load(&self, guest: &GuestName) -> Vec<Payment>;

    fn save(&self, guest: &GuestName, payments: Vec<Payment>);

    /// mutate the guest's payment list atomically
    fn update<T>(&self, guest: &GuestName, f: impl FnOnce(&mut Vec<Payment>) -> T) -> T;

    fn append(&self, guest: &GuestName, payment: Payment) {
        self.update(guest, |payments| payments.push(payment));
    }
}

/// issued invoices
pub trait InvoiceStore: Send + Sync {
    fn save(&self, invoice: Invoice);

    fn get(&self, id: &InvoiceId) -> Option<Invoice>;

    /// the guest's invoices, oldest first
    fn load_for(&self, guest: &GuestName) -> Vec<Invoice>;
}

/// in-memory room directory
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<RoomNumber, Room>,
    order: RwLock<Vec<RoomNumber>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// store pre-populated with empty rooms
    pub fn with_rooms<I, S>(numbers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = Self::new();
        for number in numbers {
            let number = RoomNumber::new(number)?;
            if !store.insert_new(Room::new(number.clone())) {
                return Err(HotelError::DuplicateRoom { room: number });
            }
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn save(&self, room: Room) {
        match self.rooms.entry(room.number.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(room);
            }
            Entry::Vacant(entry) => {
                let number = room.number.clone();
                entry.insert(room);
                self.order
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(number);
            }
        }
    }

    fn insert_new(&self, room: Room) -> bool {
        match self.rooms.entry(room.number.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                let number = room.number.clone();
                entry.insert(room);
                self.order
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(number);
                true
            }
        }
    }

    fn room(&self, number: &RoomNumber) -> Option<Room> {
        self.rooms.get(number).map(|e| e.value().clone())
    }

    fn all_rooms(&self) -> Vec<Room> {
        // snapshot the order so no shard is read under the order lock
        let order = self
            .order
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        order.iter().filter_map(|number| self.room(number)).collect()
    }

    fn update<T>(&self, number: &RoomNumber, f: impl FnOnce(&mut Room) -> T) -> Option<T> {
        self.rooms.get_mut(number).map(|mut e| f(e.value_mut()))
    }
}

/// in-memory payment storage
#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    payments: DashMap<GuestName, Vec<Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn load(&self, guest: &GuestName) -> Vec<Payment> {
        self.payments
            .get(guest)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    fn save(&self, guest: &GuestName, payments: Vec<Payment>) {
        self.payments.insert(guest.clone(), payments);
    }

    fn update<T>(&self, guest: &GuestName, f: impl FnOnce(&mut Vec<Payment>) -> T) -> T {
        let mut entry = self.payments.entry(guest.clone()).or_default();
        f(entry.value_mut())
    }
}

/// in-memory invoice storage
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    invoices: DashMap<InvoiceId, Invoice>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn save(&self, invoice: Invoice) {
        self.invoices.insert(invoice.id, invoice);
    }

    fn get(&self, id: &InvoiceId) -> Option<Invoice> {
        self.invoices.get(id).map(|e| e.value().clone())
    }

    fn load_for(&self, guest: &GuestName) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|e| &e.value().guest == guest)
            .map(|e| e.value().clone())
            .collect();
        invoices.sort_by_key(|invoice| invoice.issued_at);
        invoices
    }
}
